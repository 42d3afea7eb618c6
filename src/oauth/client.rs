// Config-driven OAuth client for the authorization-code flow

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::models::UserProfile;
use crate::oauth::{IdentityProvider, ProviderError};
use crate::settings::AuthgateSettings;

/// Token endpoint response; only the access token is consumed here, the
/// remaining fields (token type, expiry, refresh token) are out of scope
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Structured error body providers return on failed token exchanges
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Raw userinfo payload as providers send it
///
/// Google's v1 userinfo endpoint uses `id`; OIDC userinfo uses `sub`. Both
/// map onto the provider id here.
#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(alias = "sub")]
    id: Option<String>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Production [`IdentityProvider`] backed by `reqwest`
///
/// Configuration is resolved once at construction; the client is cheap to
/// clone and share across workers.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    authorization_endpoint: Url,
    token_endpoint: String,
    userinfo_endpoint: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl OAuthClient {
    /// Build the client from loaded settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The client id or client secret is not configured
    /// - The authorization endpoint is not a valid URL
    /// - The underlying HTTP client fails to initialize
    pub fn from_settings(settings: &AuthgateSettings) -> anyhow::Result<Self> {
        let provider = &settings.provider;
        let client_id = provider.get_client_id().ok_or_else(|| {
            anyhow::anyhow!("Client ID not configured for provider {}", provider.name)
        })?;
        let client_secret = provider.get_client_secret().ok_or_else(|| {
            anyhow::anyhow!(
                "Client secret not configured for provider {}",
                provider.name
            )
        })?;

        let authorization_endpoint = Url::parse(&provider.authorization_endpoint)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(provider.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            authorization_endpoint,
            token_endpoint: provider.token_endpoint.clone(),
            userinfo_endpoint: provider.userinfo_endpoint.clone(),
            client_id,
            client_secret,
            redirect_uri: settings.redirect_uri(),
            scopes: provider.scopes.clone(),
        })
    }

    /// Extract the most descriptive message from a failed provider response
    fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<ProviderErrorBody>(body) {
            Ok(parsed) => {
                let detail = parsed
                    .error_description
                    .or(parsed.error)
                    .unwrap_or_else(|| "no error detail provided".to_string());
                format!("provider responded with status {status}: {detail}")
            }
            Err(_) => format!("provider responded with status {status}"),
        }
    }
}

#[async_trait]
impl IdentityProvider for OAuthClient {
    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", &self.redirect_uri);
        params.insert("client_id", &self.client_id);
        params.insert("client_secret", &self.client_secret);

        log::debug!("Exchanging authorization code at {}", self.token_endpoint);
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Exchange(Self::describe_failure(
                status, &body,
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Exchange(format!("invalid token response: {e}")))?;

        Ok(token_response.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, ProviderError> {
        log::debug!("Fetching user profile from {}", self.userinfo_endpoint);
        let response = self
            .http
            .get(&self.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::ProfileFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ProfileFetch(Self::describe_failure(
                status, &body,
            )));
        }

        let raw: RawProfile = response
            .json()
            .await
            .map_err(|e| ProviderError::ProfileFetch(format!("invalid profile response: {e}")))?;

        // The email is the user store's natural key; reject its absence here
        // rather than letting a null key reach persistence
        let email = match raw.email {
            Some(email) if !email.is_empty() => email,
            _ => return Err(ProviderError::MissingEmail),
        };

        Ok(UserProfile {
            provider_id: raw.id,
            email,
            name: raw.name,
            picture_url: raw.picture,
        })
    }
}
