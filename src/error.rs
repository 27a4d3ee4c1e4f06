use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `steward`.
///
/// Dialogue and command handlers match on these to pick the user-facing
/// message; I/O code underneath keeps using `anyhow::Result` for context
/// chains and is converted at the seam.
#[derive(Debug, Error)]
pub enum StewardError {
    // ── Dialogue ────────────────────────────────────────────────────────
    #[error("no active email context; read an email first")]
    NoActiveContext,

    #[error("a draft is already in progress")]
    DraftInProgress,

    // ── Parsing ─────────────────────────────────────────────────────────
    #[error("could not parse time string: {0}")]
    UnparsableTime(String),

    #[error("invalid recurrence pattern: {0}")]
    InvalidRecurrence(String),

    // ── Memory ──────────────────────────────────────────────────────────
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    // ── External collaborators ──────────────────────────────────────────
    #[error(transparent)]
    ExternalProvider(#[from] ProviderError),

    // ── Commands ────────────────────────────────────────────────────────
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    // ── Config ──────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

// ─── External provider errors ────────────────────────────────────────────────

/// Failure of a call into an email, calendar or language-model collaborator.
#[derive(Debug, Clone, Error)]
#[error("{operation} failed: {kind}")]
pub struct ProviderError {
    pub operation: String,
    pub kind: ProviderErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderErrorKind {
    #[error("timed out")]
    Timeout,

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

impl ProviderError {
    pub fn new(operation: impl Into<String>, kind: ProviderErrorKind) -> Self {
        Self {
            operation: operation.into(),
            kind,
        }
    }

    pub fn failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(operation, ProviderErrorKind::Failed(message.into()))
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ProviderErrorKind::Timeout
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, StewardError>;
