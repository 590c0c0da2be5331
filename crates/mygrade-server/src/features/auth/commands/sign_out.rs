use thiserror::Error;

use crate::identity::{IdentityError, IdentityProvider};
use crate::session::{InactivityMonitor, WatchKey};

#[derive(Debug, Clone)]
pub struct SignOutCommand {
    pub token: String,
}

#[derive(Debug, Error)]
pub enum SignOutError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// End the administrator session and tear its watchdog down.
#[tracing::instrument(skip_all)]
pub async fn handle(
    identity: &dyn IdentityProvider,
    activity: &InactivityMonitor,
    command: SignOutCommand,
) -> Result<(), SignOutError> {
    activity.disarm(&WatchKey::Admin(command.token.clone()));
    identity.sign_out(&command.token).await?;
    tracing::info!("Administrator signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminAccount;
    use crate::identity::local::{test_hash, LocalIdentity};
    use crate::session::WatchStatus;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sign_out_revokes_and_disarms() {
        let identity = LocalIdentity::new(&[AdminAccount {
            email: "admin@school.edu".to_string(),
            password_hash: test_hash("secret"),
        }]);
        let monitor = InactivityMonitor::new(Duration::from_secs(600));
        let session = identity.sign_in("admin@school.edu", "secret").await.unwrap();
        let key = WatchKey::Admin(session.token.clone());
        monitor.arm(key.clone(), || {});

        let auth = identity.auth_state(&session.token).await.unwrap();
        handle(
            &identity,
            &monitor,
            SignOutCommand {
                token: session.token.clone(),
            },
        )
        .await
        .unwrap();

        assert_eq!(monitor.status(&key), WatchStatus::Inactive);
        assert!(auth.borrow().is_none());
        assert!(identity
            .auth_state(&session.token)
            .await
            .unwrap()
            .borrow()
            .is_none());
    }
}
