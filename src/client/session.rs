use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::api::{ApiClient, ClientError};
use super::store::{SessionStore, StoredSession};
use crate::auth::dto::{
    ChangePasswordRequest, LoginRequest, PublicUser, RegisterRequest, UpdateProfileRequest,
};
use crate::auth::jwt::Claims;

/// Reads the expiry of a token without checking its signature. The client
/// never holds the signing secret; the server still validates every request.
fn unverified_expiry(token: &str) -> Option<i64> {
    let mut validation = Validation::new(Algorithm::HS256);
    #[allow(deprecated)]
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(b""), &validation)
        .map(|data| data.claims.exp)
        .ok()
}

pub(crate) fn token_is_live(token: &str, now: OffsetDateTime) -> bool {
    matches!(unverified_expiry(token), Some(exp) if exp > now.unix_timestamp())
}

/// Signed-in state of a client: the bearer token plus a cached copy of the
/// user, mirrored into a [`SessionStore`] after every change.
pub struct Session {
    api: ApiClient,
    store: Arc<dyn SessionStore>,
    current: Option<StoredSession>,
}

impl Session {
    /// Rehydrates from the store. A stored session whose token is garbled or
    /// expired is dropped and the store cleared.
    pub async fn load(api: ApiClient, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let stored = match store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "stored session unreadable, discarding");
                store.clear().await?;
                None
            }
        };

        let current = match stored {
            Some(s) if token_is_live(&s.token, OffsetDateTime::now_utc()) => {
                debug!(user_id = %s.user.id, "session restored");
                Some(s)
            }
            Some(_) => {
                info!("stored session expired, discarding");
                store.clear().await?;
                None
            }
            None => None,
        };

        Ok(Self {
            api,
            store,
            current,
        })
    }

    pub fn current_user(&self) -> Option<&PublicUser> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<&PublicUser, ClientError> {
        let resp = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.replace(StoredSession {
            token: resp.token,
            user: resp.user,
        })
        .await
    }

    /// Registers and signs in with the returned token.
    pub async fn register(&mut self, req: &RegisterRequest) -> Result<&PublicUser, ClientError> {
        let resp = self.api.register(req).await?;
        self.replace(StoredSession {
            token: resp.token,
            user: resp.user,
        })
        .await
    }

    /// Local only; the token simply stops being used.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        self.current = None;
        self.store.clear().await?;
        Ok(())
    }

    /// Re-fetches the user from the server. A 401 means the token is no
    /// longer accepted and the session is dropped.
    pub async fn refresh(&mut self) -> Result<&PublicUser, ClientError> {
        let token = self.require_token()?;
        match self.api.me(&token).await {
            Ok(user) => self.replace(StoredSession { token, user }).await,
            Err(e) if e.is_unauthenticated() => {
                info!("server rejected session token, logging out");
                self.logout().await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_profile(
        &mut self,
        req: &UpdateProfileRequest,
    ) -> Result<&PublicUser, ClientError> {
        let token = self.require_token()?;
        let user = self.api.update_profile(&token, req).await?;
        self.replace(StoredSession { token, user }).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ClientError> {
        let token = self.require_token()?;
        self.api
            .change_password(
                &token,
                &ChangePasswordRequest {
                    current_password: current_password.to_string(),
                    new_password: new_password.to_string(),
                },
            )
            .await
    }

    fn require_token(&self) -> Result<String, ClientError> {
        self.token()
            .map(str::to_string)
            .ok_or(ClientError::NotLoggedIn)
    }

    async fn replace(&mut self, session: StoredSession) -> Result<&PublicUser, ClientError> {
        self.store.save(&session).await?;
        Ok(&self.current.insert(session).user)
    }
}
