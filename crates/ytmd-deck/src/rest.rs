//! REST half of the companion API.

use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use ytmd_proto::config::CompanionConfig;
use ytmd_proto::protocol::{
    AuthCodeOutput, AuthCodeRequest, AuthTokenOutput, AuthTokenRequest, Command, CompanionError,
    PlaylistOutput, API_PREFIX,
};
use ytmd_proto::settings::GlobalSettings;

#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: String,
    token: String,
    app_id: String,
    app_name: String,
    app_version: String,
    request_timeout: Duration,
    auth_timeout: Duration,
}

impl RestClient {
    pub fn new(http: reqwest::Client, companion: &CompanionConfig, settings: &GlobalSettings) -> Self {
        Self {
            http,
            base: base_url(settings),
            token: settings.token.clone(),
            app_id: companion.app_id.clone(),
            app_name: companion.app_name.clone(),
            app_version: companion.app_version.clone(),
            request_timeout: companion.request_timeout(),
            auth_timeout: companion.auth_timeout(),
        }
    }

    /// Same client, different server or token.
    pub fn with_settings(&self, settings: &GlobalSettings) -> Self {
        Self {
            base: base_url(settings),
            token: settings.token.clone(),
            ..self.clone()
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            builder
        } else {
            builder.header(AUTHORIZATION, &self.token)
        }
    }

    /// Send one command. A `limit` replaces the per-request timeout and
    /// bounds the whole call, response body included.
    pub async fn command(&self, command: &Command, limit: Option<Duration>) -> Result<(), CompanionError> {
        debug!("REST: command {}", command.label());
        let request = self
            .authorized(self.http.post(format!("{}/command", self.base)))
            .json(command);

        let Some(limit) = limit else {
            let response = request
                .timeout(self.request_timeout)
                .send()
                .await
                .map_err(transport_error)?;
            return check(response).await.map(|_| ());
        };

        let call = async {
            let response = request.send().await.map_err(transport_error)?;
            check(response).await.map(|_| ())
        };
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(CompanionError::new(format!("Timed out after {}s", limit.as_secs()))),
        }
    }

    pub async fn playlists(&self) -> Result<Vec<PlaylistOutput>, CompanionError> {
        let request = self
            .authorized(self.http.get(format!("{}/playlists", self.base)))
            .timeout(self.request_timeout);
        let response = request.send().await.map_err(transport_error)?;
        decode(response).await
    }

    pub async fn auth_code(&self) -> Result<String, CompanionError> {
        let body = AuthCodeRequest {
            app_id: &self.app_id,
            app_name: &self.app_name,
            app_version: &self.app_version,
        };
        let response = self
            .http
            .post(format!("{}/auth/requestcode", self.base))
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let output: AuthCodeOutput = decode(response).await?;
        output
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CompanionError::new("No authorization code received"))
    }

    /// Blocks server-side until the user confirms or rejects the code.
    pub async fn auth_token(&self, code: &str) -> Result<String, CompanionError> {
        let body = AuthTokenRequest {
            app_id: &self.app_id,
            code,
        };
        let response = self
            .http
            .post(format!("{}/auth/request", self.base))
            .timeout(self.auth_timeout)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let output: AuthTokenOutput = decode(response).await?;
        output
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CompanionError::new("No token received"))
    }
}

pub fn base_url(settings: &GlobalSettings) -> String {
    let settings = settings.normalized();
    format!("http://{}:{}{}", settings.host, settings.port_number(), API_PREFIX)
}

pub fn transport_error(error: reqwest::Error) -> CompanionError {
    let message = if error.is_timeout() {
        "Request timed out".to_string()
    } else {
        error.to_string()
    };
    CompanionError {
        message,
        status_code: error.status().map(|s| s.as_u16()),
    }
}

/// Decode a non-2xx body. The server sends `{message, statusCode}`; anything
/// else falls back to the HTTP status.
pub fn error_from_body(status: u16, body: &str) -> CompanionError {
    match serde_json::from_str::<CompanionError>(body) {
        Ok(mut error) if !error.message.is_empty() => {
            error.status_code.get_or_insert(status);
            error
        }
        _ => CompanionError::with_status(format!("Request failed with status {}", status), status),
    }
}

async fn check(response: Response) -> Result<Response, CompanionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CompanionError> {
    let response = check(response).await?;
    response
        .json()
        .await
        .map_err(|e| CompanionError::new(format!("Malformed response: {}", e)))
}
