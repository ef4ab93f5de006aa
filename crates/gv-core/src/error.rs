//! Errors raised by remote collaborators

use thiserror::Error;

/// Failure reported by a remote fetch or save.
///
/// The variant is chosen by the collaborator, never inferred from the payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Error with a user-facing message and an optional detail payload
    #[error("{message}")]
    Structured {
        message: String,
        detail: Option<serde_json::Value>,
    },
    
    /// Error carrying only a name and a message
    #[error("{name}: {message}")]
    Generic {
        name: String,
        message: String,
    },
}

impl RemoteError {
    pub fn structured(message: impl Into<String>, detail: Option<serde_json::Value>) -> Self {
        RemoteError::Structured {
            message: message.into(),
            detail,
        }
    }
    
    pub fn generic(name: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteError::Generic {
            name: name.into(),
            message: message.into(),
        }
    }
    
    /// Message shown to the user
    pub fn user_message(&self) -> String {
        self.to_string()
    }
    
    /// Detail payload, only present on structured errors
    pub fn detail(&self) -> Option<&serde_json::Value> {
        match self {
            RemoteError::Structured { detail, .. } => detail.as_ref(),
            RemoteError::Generic { .. } => None,
        }
    }
    
    /// Whether a details view can be opened for this error
    pub fn has_details(&self) -> bool {
        self.detail().is_some()
    }
}
