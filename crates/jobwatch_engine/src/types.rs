use std::fmt;

/// Why a rendering-engine call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFailureKind {
    /// The engine process or its transport went away mid-call.
    Crashed,
    /// No usable engine could be started (binary missing, launch refused).
    Unavailable,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    /// The page answered but could not be driven (script error, navigation refused).
    Page,
}

impl fmt::Display for RenderFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderFailureKind::Crashed => write!(f, "engine crashed"),
            RenderFailureKind::Unavailable => write!(f, "engine unavailable"),
            RenderFailureKind::InvalidUrl => write!(f, "invalid url"),
            RenderFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            RenderFailureKind::Timeout => write!(f, "timeout"),
            RenderFailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            RenderFailureKind::Decode => write!(f, "undecodable page"),
            RenderFailureKind::Page => write!(f, "page error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RenderError {
    pub kind: RenderFailureKind,
    pub message: String,
}

impl RenderError {
    pub fn new(kind: RenderFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Transport-level failures mean the session is gone and must be rebuilt.
    pub fn is_crash(&self) -> bool {
        self.kind == RenderFailureKind::Crashed
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("rendering engine unavailable: {0}")]
    EngineUnavailable(RenderError),
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("render failed: {0}")]
    Render(RenderError),
    #[error("invalid search url: {0}")]
    SearchUrl(#[from] url::ParseError),
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
