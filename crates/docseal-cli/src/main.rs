//! DocSeal CLI: hash, seal and verify loan documents against the sealing API.
//!
//! Configure with DOCSEAL_API_URL (or API_URL) and optionally DOCSEAL_API_KEY.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use docseal_api_client::ApiClient;
use docseal_cli::{init_tracing, parse_field_assignment, print_json, short_hash, PRIVACY_NOTICE};
use docseal_core::hashing::{is_sha256_hex, FileDigest};
use docseal_core::models::{SealMode, UploadFailure};
use docseal_core::{
    hash_file, ClientConfig, ErrorReport, LocalStore, SealingSession, SuccessSummary,
    VerificationReport,
};
use serde::Serialize;
use serde_json::json;

#[derive(Parser)]
#[command(name = "docseal", about = "Seal and verify loan documents")]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the SHA-256 hash of a document
    Hash {
        /// Path to the document
        file: PathBuf,
    },
    /// Check whether a document (or hash) has been sealed
    Verify {
        /// Path to the document
        file: Option<PathBuf>,
        /// Hex SHA-256 hash instead of a file
        #[arg(long, conflicts_with = "file")]
        hash: Option<String>,
        /// Record schema id
        #[arg(long)]
        etid: Option<u32>,
    },
    /// Seal a loan document
    Seal {
        /// Path to the document
        file: PathBuf,
        /// JSON document to pre-fill the form (flat or nested borrower shape)
        #[arg(long)]
        form: Option<PathBuf>,
        /// Metadata JSON file replacing the whole form
        #[arg(long)]
        metadata: Option<PathBuf>,
        /// Set a single field, e.g. --set borrower_email=jane@example.com
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// standard, maximum-security or quantum-safe
        #[arg(long, default_value = "standard")]
        mode: String,
        /// Record schema id
        #[arg(long)]
        etid: Option<u32>,
        /// Start from the saved draft
        #[arg(long)]
        resume: bool,
        /// Automatic retries for retryable failures
        #[arg(long, default_value = "0")]
        retries: u32,
    },
    /// Fetch the proof bundle of a sealed artifact
    Proof {
        /// Artifact id
        artifact_id: String,
    },
    /// Fetch borrower details of a sealed loan document
    Borrower {
        /// Loan document id
        document_id: String,
    },
    /// Fetch the audit trail of a sealed loan document
    AuditTrail {
        /// Loan document id
        document_id: String,
    },
    /// Saved draft operations
    Draft {
        #[command(subcommand)]
        sub: DraftCommands,
    },
    /// Privacy notice state
    PrivacyNotice {
        #[command(subcommand)]
        sub: PrivacyNoticeCommands,
    },
}

#[derive(Subcommand)]
enum DraftCommands {
    /// Print the saved draft
    Show,
    /// Delete the saved draft
    Clear,
}

#[derive(Subcommand)]
enum PrivacyNoticeCommands {
    /// Stop showing the privacy notice
    Dismiss,
    /// Show whether the notice was dismissed
    Status,
}

fn emit<T: Serialize + Display>(json: bool, value: &T) -> anyhow::Result<()> {
    if json {
        print_json(value)
    } else {
        println!("{}", value);
        Ok(())
    }
}

async fn digest(path: &Path, max_size: u64) -> anyhow::Result<FileDigest> {
    let path = path.to_path_buf();
    let digest = tokio::task::spawn_blocking(move || hash_file(&path, max_size))
        .await
        .context("Hashing task panicked")??;
    Ok(digest)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()
        .context("Invalid configuration. Check DOCSEAL_API_URL and related variables")?;
    let store = LocalStore::open(&config.state_dir);

    match cli.command {
        Commands::Hash { file } => {
            let digest = digest(&file, config.max_file_size_bytes).await?;
            if cli.json {
                print_json(&json!({
                    "file_name": digest.file.file_name,
                    "size": digest.file.size,
                    "content_type": digest.file.content_type,
                    "hash": digest.hash,
                }))?;
            } else {
                println!("{}  {}", digest.hash, digest.file.file_name);
            }
        }
        Commands::Verify { file, hash, etid } => {
            let hash = match (file, hash) {
                (_, Some(hash)) => {
                    let hash = hash.trim().to_lowercase();
                    if !is_sha256_hex(&hash) {
                        anyhow::bail!("--hash must be 64 hex characters");
                    }
                    hash
                }
                (Some(file), None) => digest(&file, config.max_file_size_bytes).await?.hash,
                (None, None) => anyhow::bail!("Provide a file or --hash"),
            };
            let client = ApiClient::from_config(&config)?;
            let response = client
                .verify(&hash, etid.unwrap_or(config.default_etid))
                .await?;
            let result = response.into_result();
            emit(cli.json, &VerificationReport::new(&hash, result.as_ref()))?;
        }
        Commands::Seal {
            file,
            form,
            metadata,
            set,
            mode,
            etid,
            resume,
            retries,
        } => {
            let mode: SealMode = mode.parse()?;
            let client = ApiClient::from_config(&config)?;

            if !store.privacy_notice_dismissed()? {
                eprintln!("{}\n", PRIVACY_NOTICE);
            }

            let mut session = SealingSession::new(client, &config).with_store(Some(store));
            if resume {
                match session.restore_draft().await? {
                    Some(snapshot) => eprintln!("Restored draft saved at {}", snapshot.timestamp),
                    None => eprintln!("No saved draft to resume"),
                }
            }
            if let Some(path) = metadata {
                let text = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
                session.edit_metadata(&text).await?;
            }
            if let Some(path) = form {
                session.import_document(&path).await?;
            }
            for assignment in &set {
                let (field, value) = parse_field_assignment(assignment)?;
                if let Some(message) = session.set_field(field, &value).await {
                    eprintln!("warning: {}: {}", field.label(), message);
                }
            }
            session.set_mode(mode).await;
            if let Some(etid) = etid {
                session.set_etid(etid).await;
            }

            session.select_file(&file).await?;
            if let Some(notice) = session.machine().notice() {
                anyhow::bail!("{}", notice.message);
            }
            tracing::info!(
                hash = %short_hash(&session.machine().draft().file_hash),
                "Document hashed"
            );

            let progress_task = (!cli.json).then(|| {
                let mut progress = session.subscribe_progress();
                tokio::spawn(async move {
                    while progress.changed().await.is_ok() {
                        let value = *progress.borrow_and_update();
                        eprint!("\rSealing (heartbeat) {:>3}%", value);
                        if value == 100 {
                            eprintln!();
                            break;
                        }
                    }
                })
            });

            let mut outcome = session.submit().await;
            let mut attempt = 0;
            while outcome.is_err() && attempt < retries && session.machine().can_retry() {
                attempt += 1;
                tracing::warn!(attempt, "Retrying seal");
                outcome = session.retry().await;
            }
            if let Some(task) = progress_task {
                task.abort();
            }

            match outcome {
                Ok(response) => {
                    let mode = session.machine().submitted_mode().unwrap_or(mode);
                    emit(cli.json, &SuccessSummary::new(&response, mode))?;
                }
                Err(err) => {
                    eprintln!();
                    for field_error in err.field_errors() {
                        eprintln!("  {}: {}", field_error.field.label(), field_error.message);
                    }
                    let draft = session.machine().draft();
                    let context = json!({
                        "file_name": draft.file.as_ref().map(|f| f.file_name.clone()),
                        "document_hash": draft.file_hash,
                        "mode": session.machine().mode(),
                        "etid": draft.etid,
                    });
                    let report =
                        ErrorReport::new(&UploadFailure::from(&err), &config.support_email, context);
                    if cli.json {
                        print_json(&report)?;
                    } else {
                        eprintln!("{}", report);
                    }
                    return Err(err.into());
                }
            }
        }
        Commands::Proof { artifact_id } => {
            let client = ApiClient::from_config(&config)?;
            let proof = client.get_proof(&artifact_id).await?;
            print_json(&proof)?;
        }
        Commands::Borrower { document_id } => {
            let client = ApiClient::from_config(&config)?;
            let borrower = client.get_borrower(&document_id).await?;
            print_json(&borrower)?;
        }
        Commands::AuditTrail { document_id } => {
            let client = ApiClient::from_config(&config)?;
            let trail = client.get_audit_trail(&document_id).await?;
            if cli.json {
                print_json(&trail)?;
            } else if trail.events.is_empty() {
                println!("No audit events for {}", document_id);
            } else {
                for event in &trail.events {
                    println!(
                        "{:<25} {:<20} {}",
                        event.timestamp.as_deref().unwrap_or("-"),
                        event.event_type,
                        event.actor.as_deref().unwrap_or("")
                    );
                }
            }
        }
        Commands::Draft { sub } => match sub {
            DraftCommands::Show => match store.load_draft()? {
                Some(snapshot) => print_json(&snapshot)?,
                None => println!("No saved draft"),
            },
            DraftCommands::Clear => {
                store.clear_draft()?;
                println!("Draft cleared");
            }
        },
        Commands::PrivacyNotice { sub } => match sub {
            PrivacyNoticeCommands::Dismiss => {
                store.dismiss_privacy_notice()?;
                println!("Privacy notice dismissed");
            }
            PrivacyNoticeCommands::Status => {
                let dismissed = store.privacy_notice_dismissed()?;
                print_json(&json!({ "privacy_notice_dismissed": dismissed }))?;
            }
        },
    }

    Ok(())
}
