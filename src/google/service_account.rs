//! Service account credentials and the OAuth2 JWT bearer grant
//!
//! Google service accounts authenticate without a user in the loop: a
//! JWT signed with the account's RSA key is exchanged at the token
//! endpoint for a short lived access token.
//! See https://developers.google.com/identity/protocols/oauth2/service-account

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};

pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Refresh a little early so a token never expires mid-request
const EXPIRY_SKEW_SECS: i64 = 60;

/// The fields of a service account key file that are needed to sign
/// assertions. Everything else in the document is ignored.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: Option<String>,
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).context("Invalid service account JSON")?;
        if let Some(key_type) = &key.key_type
            && key_type != "service_account"
        {
            bail!("Expected a service_account credential, got {}", key_type);
        }
        Ok(key)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Credentials ready to sign assertions for a single scope
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub token_uri: String,
    pub scope: String,
    key_id: Option<String>,
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountCredentials {
    /// Load credentials from the raw key document held in config.
    pub fn from_json(json: Option<&str>, scope: &str) -> Result<Self> {
        let json = json.ok_or_else(|| anyhow!("GOOGLE_CREDENTIALS_JSON is not set"))?;
        let key = ServiceAccountKey::from_json(json)?;
        Self::from_key(key, scope)
    }

    pub fn from_key(key: ServiceAccountKey, scope: &str) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("Invalid service account private key")?;
        Ok(Self {
            client_email: key.client_email,
            token_uri: key.token_uri,
            scope: scope.to_string(),
            key_id: key.private_key_id,
            encoding_key,
        })
    }

    /// Signed RS256 assertion for the JWT bearer grant
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        let iat = now.timestamp();
        let claims = Claims {
            iss: &self.client_email,
            scope: &self.scope,
            aud: &self.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .context("Failed to sign service account assertion")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) < self.expires_at
    }
}

/// Exchange a signed assertion for an access token
pub async fn fetch_access_token(
    client: &Client,
    credentials: &ServiceAccountCredentials,
) -> Result<AccessToken> {
    let now = Utc::now();
    let assertion = credentials.assertion(now)?;

    let res = client
        .post(&credentials.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        bail!("Token exchange failed: {} ({})", status, text);
    }

    let token: TokenResponse = serde_json::from_str(&text)?;
    let expires_in = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
    tracing::debug!(
        "Fetched access token for {} valid for {}s",
        credentials.client_email,
        expires_in
    );

    Ok(AccessToken {
        token: token.access_token,
        expires_at: now + Duration::seconds(expires_in),
    })
}

type PendingToken = Shared<BoxFuture<'static, Result<AccessToken, Arc<anyhow::Error>>>>;

#[derive(Default)]
enum TokenState {
    #[default]
    Empty,
    Ready(AccessToken),
    Pending(PendingToken),
}

/// Holds the most recent access token so concurrent requests share it
/// instead of each running the token exchange. While a refresh is in
/// flight every caller awaits that same fetch and sees its result.
#[derive(Default)]
pub struct TokenCache {
    state: std::sync::Mutex<TokenState>,
}

impl TokenCache {
    pub async fn get_or_refresh(
        &self,
        client: &Client,
        credentials: &Arc<ServiceAccountCredentials>,
    ) -> Result<String> {
        // The lock is never held across an await
        let fetch = {
            let mut state = self.state.lock().expect("Unable to lock token cache");
            if let TokenState::Ready(token) = &*state
                && token.is_fresh(Utc::now())
            {
                return Ok(token.token.clone());
            }

            if let TokenState::Pending(fetch) = &*state {
                fetch.clone()
            } else {
                let client = client.clone();
                let credentials = Arc::clone(credentials);
                let fetch = async move {
                    fetch_access_token(&client, &credentials)
                        .await
                        .map_err(Arc::new)
                }
                .boxed()
                .shared();
                *state = TokenState::Pending(fetch.clone());
                fetch
            }
        };

        let result = fetch.clone().await;

        let mut state = self.state.lock().expect("Unable to lock token cache");
        if let TokenState::Pending(pending) = &*state
            && pending.ptr_eq(&fetch)
        {
            // A failed fetch leaves the cache empty so the next request retries
            *state = match &result {
                Ok(token) => TokenState::Ready(token.clone()),
                Err(_) => TokenState::Empty,
            };
        }

        result
            .map(|token| token.token)
            .map_err(|err| anyhow!("{:#}", err))
    }

    /// Drop `token` if it is still the cached one, e.g. after the
    /// provider rejected it.
    pub fn invalidate(&self, token: &str) {
        let mut state = self.state.lock().expect("Unable to lock token cache");
        if let TokenState::Ready(cached) = &*state
            && cached.token == token
        {
            tracing::debug!("Dropping rejected access token");
            *state = TokenState::Empty;
        }
    }
}
