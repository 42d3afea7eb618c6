//! OAuth authorization-code flow types
//!
//! This module defines the callback payload, the provider-side error
//! taxonomy, and the [`IdentityProvider`] seam the orchestrator talks
//! through. The production implementation lives in [`client`]; tests swap in
//! a mock behind the same trait.

pub mod client;

pub use client::OAuthClient;

use crate::models::UserProfile;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// OAuth callback structure for handling responses from the provider
#[derive(Deserialize, Debug, Default, Clone)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Failures surfaced by the identity provider or the transport to it
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider redirected back with an `error` parameter instead of a code
    #[error("provider rejected the authorization request: {0}")]
    Denied(String),

    /// Code-for-token exchange failed (non-success response or transport error)
    #[error("token exchange failed: {0}")]
    Exchange(String),

    /// Profile fetch with the access token failed
    #[error("profile fetch failed: {0}")]
    ProfileFetch(String),

    /// The returned profile carried no email address, which is the user
    /// store's natural key
    #[error("provider profile is missing an email address")]
    MissingEmail,
}

/// The two outbound calls of the authorization-code flow, plus the
/// authorization URL the flow starts with
///
/// Implementations must apply a bounded request timeout; an elapsed timeout
/// surfaces as [`ProviderError::Exchange`] or [`ProviderError::ProfileFetch`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the provider authorization URL embedding the given state token
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for an access token
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Exchange`] on a non-success response or a
    /// transport failure, carrying the provider's structured error message
    /// when one is present
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError>;

    /// Fetch the user profile authenticated by the given access token
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ProfileFetch`] on a non-success response or
    /// transport failure, and [`ProviderError::MissingEmail`] if the profile
    /// parses but carries no email address
    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, ProviderError>;
}
