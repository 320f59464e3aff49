use thiserror::Error;

/// Failure reported by an [`HttpTransport`](crate::ticketfu::transport::HttpTransport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("response body unreadable: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("summary not found at {url}")]
    NotFound { url: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("summary parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryErrorKind {
    NotFound,
    Transport,
    Parse,
}

impl SummaryErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Transport => "transport",
            Self::Parse => "parse",
        }
    }
}

impl SummaryError {
    pub fn kind(&self) -> SummaryErrorKind {
        match self {
            Self::NotFound { .. } => SummaryErrorKind::NotFound,
            Self::Transport(_) => SummaryErrorKind::Transport,
            Self::Parse(_) => SummaryErrorKind::Parse,
        }
    }

    /// Maps a transport failure, turning a 404 into [`SummaryError::NotFound`].
    pub fn from_transport(err: TransportError) -> Self {
        match err {
            TransportError::Status { status: 404, url } => Self::NotFound { url },
            other => Self::Transport(other),
        }
    }
}
