//! User-facing outcome messages.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warn,
    Bad,
}

/// A one-line message a UI can render as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

impl Notice {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Ok,
            text: text.into(),
        }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            text: text.into(),
        }
    }

    pub fn bad(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Bad,
            text: text.into(),
        }
    }
}

impl From<&CoreError> for Notice {
    fn from(err: &CoreError) -> Self {
        if err.is_warning() {
            Notice::warn(err.user_message())
        } else {
            Notice::bad(err.user_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::LibraryError;

    #[test]
    fn error_severity() {
        let notice = Notice::from(&CoreError::from(LibraryError::BuiltinProtected));
        assert_eq!(notice.severity, Severity::Warn);

        let notice = Notice::from(&CoreError::StoreUnavailable("quota".into()));
        assert_eq!(notice, Notice::bad("Could not save the local audio."));
    }
}
