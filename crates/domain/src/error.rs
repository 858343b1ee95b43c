use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    State,
    Authorization,
    Internal,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Missing field(s): {0}.")]
    MissingField(&'static str),
    #[error("{0}")]
    InvalidDomain(String),
    #[error("This domain does not exist.")]
    NoSuchDomain,
    #[error("Cannot add a new comment because the domain is frozen.")]
    DomainFrozen,
    #[error("This thread is locked. You cannot add new comments.")]
    ThreadLocked,
    #[error("You're not authorised to do that.")]
    NotAuthorised,
    #[error("This session token is invalid.")]
    NoSuchToken,
    #[error("permission denied")]
    PermissionDenied,
    /// The source is logged where it happens, never shown to the submitter.
    #[error("Some internal error occurred.")]
    Internal(#[source] anyhow::Error),
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_) | Self::InvalidDomain(_) | Self::NoSuchDomain => {
                ErrorKind::Validation
            }
            Self::DomainFrozen | Self::ThreadLocked => ErrorKind::State,
            Self::NotAuthorised | Self::NoSuchToken | Self::PermissionDenied => {
                ErrorKind::Authorization
            }
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn internal(e: impl Into<anyhow::Error>) -> Self {
        Self::Internal(e.into())
    }
}

/// A permission service refused, or could not be asked. The reason is for
/// operator logs only.
#[derive(Debug, Error)]
#[error("permission denied: {reason}")]
pub struct PermissionDenied {
    pub reason: String,
}

impl PermissionDenied {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
