//! Mock identity provider for driving the orchestrator in tests
//!
//! Records call counts so tests can assert that rejected callbacks never
//! reach the provider, and lets the programmed profile or failure be swapped
//! mid-test to simulate repeat logins and provider outages.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::UserProfile;
use crate::oauth::{IdentityProvider, ProviderError};

/// Access token the mock hands out on successful exchanges
pub const MOCK_ACCESS_TOKEN: &str = "mock_access_token";

pub struct MockIdentityProvider {
    profile: Mutex<UserProfile>,
    exchange_error: Mutex<Option<ProviderError>>,
    profile_error: Mutex<Option<ProviderError>>,
    exchange_calls: AtomicUsize,
    profile_calls: AtomicUsize,
}

impl MockIdentityProvider {
    #[must_use]
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile: Mutex::new(profile),
            exchange_error: Mutex::new(None),
            profile_error: Mutex::new(None),
            exchange_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
        }
    }

    /// Program the exchange step to fail
    #[must_use]
    pub fn with_exchange_error(self, error: ProviderError) -> Self {
        *self.exchange_error.lock().expect("mock lock") = Some(error);
        self
    }

    /// Program the profile fetch step to fail
    #[must_use]
    pub fn with_profile_error(self, error: ProviderError) -> Self {
        *self.profile_error.lock().expect("mock lock") = Some(error);
        self
    }

    /// Replace the programmed profile, e.g. to simulate a changed name on a
    /// later login
    pub fn set_profile(&self, profile: UserProfile) {
        *self.profile.lock().expect("mock lock") = profile;
    }

    /// Number of token exchanges performed
    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    /// Number of profile fetches performed
    #[must_use]
    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "https://idp.test/authorize?client_id=test-client-id&response_type=code&state={state}"
        )
    }

    async fn exchange_code(&self, _code: &str) -> Result<String, ProviderError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.exchange_error.lock().expect("mock lock").clone() {
            return Err(error);
        }
        Ok(MOCK_ACCESS_TOKEN.to_string())
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<UserProfile, ProviderError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.profile_error.lock().expect("mock lock").clone() {
            return Err(error);
        }
        Ok(self.profile.lock().expect("mock lock").clone())
    }
}
