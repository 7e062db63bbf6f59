use std::fmt;

/// An error whose message alone is meant for the user.
///
/// Failures caused by missing setup or bad input (no Dropbox tokens, an
/// expired login, a full quota) carry instructions the user can act on;
/// everything else is reported with its full error chain.
#[derive(Debug)]
pub struct UserError(pub String);

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UserError {}

/// Whether an anyhow error chain bottoms out in a [`UserError`].
pub fn is_user_error(error: &anyhow::Error) -> bool {
    error.downcast_ref::<UserError>().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_detected_through_anyhow() {
        let error: anyhow::Error = UserError("run auth first".to_string()).into();
        assert!(is_user_error(&error));
        assert_eq!(error.to_string(), "run auth first");
    }

    #[test]
    fn test_other_errors_are_not_user_errors() {
        let error = anyhow::anyhow!("io failure");
        assert!(!is_user_error(&error));
    }
}
