//! Upload-and-seal workflow: a pure state machine plus the async session that
//! drives it against a [`SealingBackend`].

pub mod backend;
pub mod machine;
pub mod session;

pub use backend::{check_existing_seal, SealingBackend};
pub use machine::{Action, Effect, Phase, SealingMachine, UploadDraft, PROGRESS_CEILING};
pub use session::SealingSession;
