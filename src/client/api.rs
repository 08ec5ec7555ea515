use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

use crate::auth::dto::{
    AuthResponse, ChangePasswordRequest, LoginRequest, PublicUser, RegisterRequest,
    UpdateProfileRequest,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error status and message.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("http transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("session store: {0}")]
    Store(#[from] anyhow::Error),
    #[error("not logged in")]
    NotLoggedIn,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let resp = check(resp).await?;
    Ok(resp.json::<T>().await?)
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    Err(ClientError::Api { status, message })
}

/// Typed HTTP client for the `/auth` endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let resp = self.http.post(self.url("/auth/register")).json(req).send().await?;
        read_json(resp).await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let resp = self.http.post(self.url("/auth/login")).json(req).send().await?;
        read_json(resp).await
    }

    pub async fn me(&self, token: &str) -> Result<PublicUser, ClientError> {
        let resp = self
            .http
            .get(self.url("/auth/me"))
            .bearer_auth(token)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn update_profile(
        &self,
        token: &str,
        req: &UpdateProfileRequest,
    ) -> Result<PublicUser, ClientError> {
        let resp = self
            .http
            .put(self.url("/auth/profile"))
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn change_password(
        &self,
        token: &str,
        req: &ChangePasswordRequest,
    ) -> Result<(), ClientError> {
        let resp = self
            .http
            .put(self.url("/auth/password"))
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}
