use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::identity::{AuthSession, IdentityError, IdentityProvider};

/// The only message a failed sign-in ever shows
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";

#[derive(Clone, Deserialize)]
pub struct SignInCommand {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for SignInCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInCommand")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum SignInError {
    #[error("Invalid email or password.")]
    InvalidCredentials,
}

impl SignInCommand {
    pub fn validate(&self) -> Result<(), SignInError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(SignInError::InvalidCredentials);
        }
        Ok(())
    }
}

/// Check the credentials with the identity service.
///
/// Every failure, including an unreachable service, collapses into
/// [`SignInError::InvalidCredentials`]; the cause is only logged.
#[tracing::instrument(skip(identity, command), fields(email = %command.email.trim()))]
pub async fn handle(
    identity: &dyn IdentityProvider,
    command: SignInCommand,
) -> Result<AuthSession, SignInError> {
    command.validate()?;

    match identity.sign_in(command.email.trim(), &command.password).await {
        Ok(session) => {
            tracing::info!(uid = %session.user.uid, "Administrator signed in");
            Ok(session)
        },
        Err(IdentityError::InvalidCredentials) => {
            tracing::warn!("Rejected administrator credentials");
            Err(SignInError::InvalidCredentials)
        },
        Err(e) => {
            tracing::error!("Identity service failed during sign-in: {}", e);
            Err(SignInError::InvalidCredentials)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminAccount;
    use crate::identity::local::{test_hash, LocalIdentity};

    fn identity() -> LocalIdentity {
        LocalIdentity::new(&[AdminAccount {
            email: "admin@school.edu".to_string(),
            password_hash: test_hash("secret"),
        }])
    }

    fn command(email: &str, password: &str) -> SignInCommand {
        SignInCommand {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let session = handle(&identity(), command(" Admin@School.edu ", "secret"))
            .await
            .unwrap();
        assert_eq!(session.user.email, "admin@school.edu");
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn test_every_failure_has_one_message() {
        for (email, password) in [
            ("admin@school.edu", "wrong"),
            ("nobody@school.edu", "secret"),
            ("", "secret"),
            ("admin@school.edu", ""),
        ] {
            let err = handle(&identity(), command(email, password)).await.unwrap_err();
            assert_eq!(err.to_string(), INVALID_CREDENTIALS);
        }
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", command("a@b.c", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
