//! Firebase Auth REST adapter
//!
//! Uses the Identity Toolkit endpoints:
//!
//! - `POST /v1/accounts:signInWithPassword?key=...` to check credentials
//! - `POST /v1/accounts:lookup?key=...` to validate an ID token this process
//!   has not seen (e.g. after a restart)
//!
//! Firebase ID tokens cannot be revoked through the REST API, so signing out
//! only forgets the token locally.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{
    signed_out, AdminUser, AuthSession, AuthStateReceiver, IdentityError, IdentityProvider,
    TokenRegistry,
};

/// Default Identity Toolkit base URL
pub const DEFAULT_FIREBASE_AUTH_URL: &str = "https://identitytoolkit.googleapis.com";

pub struct FirebaseIdentity {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    tokens: TokenRegistry,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    local_id: String,
    email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: String,
}

impl FirebaseIdentity {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            tokens: TokenRegistry::new(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1/accounts:{}?key={}", self.base_url, method, self.api_key)
    }

    async fn lookup(&self, token: &str) -> Result<Option<AdminUser>, IdentityError> {
        let response = self
            .client
            .post(self.endpoint("lookup"))
            .json(&LookupRequest { id_token: token })
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(IdentityError::Service(format!(
                "accounts:lookup returned {}",
                response.status()
            )));
        }

        let body: LookupResponse = response.json().await?;
        Ok(body.users.into_iter().next().map(|user| AdminUser {
            uid: user.local_id,
            email: user.email,
        }))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    #[tracing::instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let response = self
            .client
            .post(self.endpoint("signInWithPassword"))
            .json(&SignInRequest {
                email: email.trim(),
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {},
            StatusCode::BAD_REQUEST => return Err(IdentityError::InvalidCredentials),
            status => {
                return Err(IdentityError::Service(format!(
                    "accounts:signInWithPassword returned {}",
                    status
                )))
            },
        }

        let body: SignInResponse = response.json().await?;
        let user = AdminUser {
            uid: body.local_id,
            email: body.email,
        };
        self.tokens.register(&body.id_token, user.clone());

        Ok(AuthSession {
            token: body.id_token,
            user,
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        self.tokens.revoke(token);
        Ok(())
    }

    async fn auth_state(&self, token: &str) -> Result<AuthStateReceiver, IdentityError> {
        if let Some(receiver) = self.tokens.watch(token) {
            return Ok(receiver);
        }

        match self.lookup(token).await? {
            Some(user) => {
                tracing::debug!(uid = %user.uid, "Restored Firebase session from ID token");
                Ok(self.tokens.register(token, user))
            },
            None => Ok(signed_out()),
        }
    }
}
