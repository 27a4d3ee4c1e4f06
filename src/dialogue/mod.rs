pub mod draft;
pub mod rules;
pub mod sessions;
pub mod state;

pub use draft::{AnswerOutcome, Drafter};
pub use rules::{QuestionRule, default_rules};
pub use sessions::{DEFAULT_SESSION, SessionRegistry};
pub use state::{DraftMode, DraftState, PendingConfirmation, SessionState};
