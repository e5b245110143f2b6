use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::{Error, Result};

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
const REDACTED: &str = "<redacted>";

/// Credentials for the password method of the identity service
#[derive(Clone, Serialize, Deserialize)]
pub struct PasswordCredentials {
    pub identity_url: String,
    pub user_name: String,
    pub password: String,
    pub user_domain: String,
    pub project_name: String,
    pub project_domain: String,
}
impl core::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("identity_url", &self.identity_url)
            .field("user_name", &self.user_name)
            .field("password", &REDACTED)
            .field("user_domain", &self.user_domain)
            .field("project_name", &self.project_name)
            .field("project_domain", &self.project_domain)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenProject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    expires_at: DateTime<Utc>,
    #[serde(default)]
    project: Option<TokenProject>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

/// A token sent in the `X-Auth-Token` header of every compute API call
#[derive(Clone, Default)]
pub struct AuthToken {
    pub(crate) value: String,
    expires_at: Option<DateTime<Utc>>,
    project_id: Option<String>,
    credentials: Option<PasswordCredentials>,
}
impl core::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &REDACTED)
            .field("expires_at", &self.expires_at)
            .field("project_id", &self.project_id)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl AuthToken {
    /// Use an already issued token, assumed to never expire
    pub fn new(value: String) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }

    /// Retrieve a project scoped token from the identity service
    ///
    /// The token is renewed with the same credentials when it is about to expire.
    pub fn from_password(credentials: PasswordCredentials) -> Result<Self> {
        log::debug!(
            "AuthToken::from_password - identity_url={} user_name={} project_name={}",
            credentials.identity_url,
            credentials.user_name,
            credentials.project_name
        );
        let (value, token) = request_token(&credentials)?;
        Ok(Self {
            value,
            expires_at: Some(token.expires_at),
            project_id: token.project.map(|p| p.id),
            credentials: Some(credentials),
        })
    }

    /// The project the token is scoped to, if known
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    fn expires_soon(&self) -> bool {
        self.expires_at
            .map_or(false, |exp| exp <= Utc::now() + Duration::seconds(30))
    }

    pub(crate) fn refresh_if_needed(&mut self) -> Result<()> {
        if !self.expires_soon() {
            return Ok(());
        }
        let credentials = self.credentials.as_ref().ok_or(Error::TokenExpired)?;
        log::debug!("Initiating token renewal");
        let (value, token) = request_token(credentials)?;
        self.value = value;
        self.expires_at = Some(token.expires_at);
        if let Some(project) = token.project {
            self.project_id = Some(project.id);
        }
        Ok(())
    }
}

fn request_token(credentials: &PasswordCredentials) -> Result<(String, TokenBody)> {
    let auth_url = format!(
        "{}/auth/tokens",
        credentials.identity_url.trim_end_matches('/')
    );
    let req = Client::new().post(&auth_url).json(&json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": credentials.user_name,
                        "domain": {"name": credentials.user_domain},
                        "password": credentials.password,
                    }
                }
            },
            "scope": {
                "project": {
                    "name": credentials.project_name,
                    "domain": {"name": credentials.project_domain},
                }
            }
        }
    }));
    let (headers, body) = crate::client::req_builder_to_response(req)?;
    let value = headers
        .get(SUBJECT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(Error::MissingSubjectToken)?
        .to_owned();
    let response: TokenResponse = serde_json::from_str(&body)?;
    log::debug!("Got a token expiring at {}", response.token.expires_at);
    Ok((value, response.token))
}
