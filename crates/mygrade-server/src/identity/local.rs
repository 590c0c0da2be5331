//! Administrator accounts from configuration

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use super::{
    signed_out, AdminUser, AuthSession, AuthStateReceiver, IdentityError, IdentityProvider,
    TokenRegistry,
};
use crate::config::AdminAccount;

/// Argon2id PHC string for `password`, the form `MYGRADE_ADMIN_ACCOUNTS`
/// expects. `Params::default()` gives the recommended cost.
pub fn hash_password(password: &str, params: Params) -> Result<String, password_hash::Error> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check `password` against a PHC string. Cost parameters come from the hash.
fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Unusable administrator password hash: {}", e);
            false
        },
    }
}

pub struct LocalIdentity {
    /// lower-cased email -> PHC password hash
    accounts: HashMap<String, String>,
    tokens: TokenRegistry,
}

impl LocalIdentity {
    pub fn new(accounts: &[AdminAccount]) -> Self {
        let accounts = accounts
            .iter()
            .map(|account| {
                (
                    account.email.trim().to_lowercase(),
                    account.password_hash.clone(),
                )
            })
            .collect();

        Self {
            accounts,
            tokens: TokenRegistry::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    #[tracing::instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let email = email.trim().to_lowercase();
        let phc = self
            .accounts
            .get(&email)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;

        // argon2 is deliberately slow; keep it off the async workers
        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &phc))
            .await
            .unwrap_or(false);
        if !verified {
            return Err(IdentityError::InvalidCredentials);
        }

        let user = AdminUser {
            uid: format!("local:{}", email),
            email,
        };
        let token = Uuid::new_v4().to_string();
        self.tokens.register(&token, user.clone());

        Ok(AuthSession { token, user })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        self.tokens.revoke(token);
        Ok(())
    }

    async fn auth_state(&self, token: &str) -> Result<AuthStateReceiver, IdentityError> {
        Ok(self.tokens.watch(token).unwrap_or_else(signed_out))
    }
}

/// Low-cost hash for tests
#[cfg(test)]
pub(crate) fn test_hash(password: &str) -> String {
    hash_password(password, light_params()).unwrap()
}

#[cfg(test)]
fn light_params() -> Params {
    Params::new(1024, 1, 1, None).unwrap()
}
