//! Authentication state machine
//!
//! [`Authenticator`] ties the flow together: it issues the provider
//! redirect, validates the callback against the session's pending
//! anti-forgery token, drives the code→token→profile exchange, upserts the
//! user record, and writes the authenticated snapshot into the session.
//!
//! Per session the machine moves Anonymous → `AwaitingCallback` (pending
//! token set) → Authenticated → Anonymous (logout). A new login initiation
//! while awaiting a callback simply overwrites the pending token; concurrent
//! login attempts do not stack.

use std::sync::Arc;

use thiserror::Error;

use crate::models::UserSnapshot;
use crate::oauth::{CallbackParams, IdentityProvider, ProviderError};
use crate::session::SessionData;
use crate::storage::{StorageError, UserStore};
use crate::utils::crypto::generate_state_token;

/// Everything that can go wrong on the authentication path
///
/// Callback failures are converted by the HTTP layer into a redirect
/// carrying [`AuthError::code`]; details stay in the server log.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The callback carried no authorization code
    #[error("missing authorization code")]
    MissingCode,

    /// The callback's state did not match the session's pending token, or no
    /// token was pending. This is the forged/replayed-callback guard.
    #[error("state parameter does not match the pending login")]
    InvalidState,

    /// The provider or the transport to it failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The user store failed or a conflict could not be resolved
    #[error(transparent)]
    Persistence(#[from] StorageError),

    /// A protected resource was accessed without an authenticated session
    #[error("authentication required")]
    Unauthorized,
}

impl AuthError {
    /// Stable, URL-safe error code for redirect query parameters
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCode => "missing_code",
            Self::InvalidState => "invalid_state",
            Self::Provider(ProviderError::Denied(_)) => "provider_denied",
            Self::Provider(ProviderError::Exchange(_)) => "exchange_failed",
            Self::Provider(ProviderError::ProfileFetch(_)) => "profile_fetch_failed",
            Self::Provider(ProviderError::MissingEmail) => "missing_email",
            Self::Persistence(_) => "persistence_error",
            Self::Unauthorized => "unauthorized",
        }
    }
}

/// The authentication orchestrator
///
/// Holds the provider client behind its trait so tests can drive the state
/// machine with a mock, and the user store for the final upsert. Session
/// state is passed in explicitly; persisting the mutated session is the
/// caller's job, on success and failure alike.
#[derive(Clone)]
pub struct Authenticator {
    provider: Arc<dyn IdentityProvider>,
    users: UserStore,
}

impl Authenticator {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, users: UserStore) -> Self {
        Self { provider, users }
    }

    /// Start a login: issue a fresh anti-forgery token, store it as the
    /// session's pending token (overwriting any prior one), and return the
    /// provider authorization URL embedding it
    ///
    /// No network call happens here; the only side effect is the session
    /// mutation.
    #[must_use]
    pub fn begin_login(&self, session: &mut SessionData) -> String {
        let state = generate_state_token();
        let url = self.provider.authorization_url(&state);
        session.pending_state = Some(state);
        url
    }

    /// Process the provider callback
    ///
    /// The pending token is consumed as the first action, so every exit path
    /// leaves the session without one: a single code/state pair can never be
    /// replayed to retry after a failed attempt. State validation happens
    /// strictly before any outbound call.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] variant matching the failing step; the
    /// session is left in a clean state (pending token cleared, user
    /// untouched) in every error case
    pub async fn handle_callback(
        &self,
        session: &mut SessionData,
        params: &CallbackParams,
    ) -> Result<UserSnapshot, AuthError> {
        // Single-use semantics: consumed no matter how this call ends
        let pending = session.pending_state.take();

        if let Some(provider_error) = &params.error {
            log::warn!("Provider signaled callback error: {provider_error}");
            return Err(ProviderError::Denied(provider_error.clone()).into());
        }

        let code = params
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::MissingCode)?;

        match (&pending, params.state.as_deref()) {
            (Some(expected), Some(received)) if expected == received => {}
            _ => {
                log::warn!("State validation failed, rejecting callback before any outbound call");
                return Err(AuthError::InvalidState);
            }
        }

        let access_token = self.provider.exchange_code(code).await?;
        let profile = self.provider.fetch_profile(&access_token).await?;
        let record = self.users.upsert_by_email(&profile).await?;
        log::info!("User signed in: {}", record.email);

        let snapshot = record.snapshot();
        session.user = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Clear all session state: pending token and authenticated user
    ///
    /// Invalidation of the session identifier itself (store destroy, cookie
    /// expiry) is the HTTP layer's part of logout.
    pub fn logout(&self, session: &mut SessionData) {
        session.pending_state = None;
        session.user = None;
    }

    /// The session's authenticated user, if any. Pure read.
    #[must_use]
    pub fn authenticated_user(&self, session: &SessionData) -> Option<UserSnapshot> {
        session.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use crate::testing::{MockIdentityProvider, TestFixtures};

    fn callback(code: Option<&str>, state: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(ToString::to_string),
            state: state.map(ToString::to_string),
            error: None,
        }
    }

    async fn authenticator_with(
        provider: Arc<MockIdentityProvider>,
    ) -> Authenticator {
        Authenticator::new(provider, TestFixtures::user_store().await)
    }

    #[tokio::test]
    async fn test_begin_login_sets_pending_token_and_embeds_it() {
        let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
        let authenticator = authenticator_with(provider).await;
        let mut session = SessionData::default();

        let url = authenticator.begin_login(&mut session);

        let pending = session.pending_state.clone().expect("pending token set");
        assert!(url.contains(&format!("state={pending}")));
    }

    #[tokio::test]
    async fn test_begin_login_overwrites_prior_pending_token() {
        let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
        let authenticator = authenticator_with(provider).await;
        let mut session = SessionData::default();

        authenticator.begin_login(&mut session);
        let first = session.pending_state.clone().unwrap();
        authenticator.begin_login(&mut session);
        let second = session.pending_state.clone().unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_callback_success_creates_user_and_authenticates_session() {
        let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
        let authenticator = authenticator_with(Arc::clone(&provider)).await;
        let mut session = SessionData::default();

        authenticator.begin_login(&mut session);
        let state = session.pending_state.clone().unwrap();

        let snapshot = authenticator
            .handle_callback(&mut session, &callback(Some("abc"), Some(&state)))
            .await
            .unwrap();

        assert_eq!(snapshot.email, "a@x.com");
        assert_eq!(session.user.as_ref().unwrap().email, "a@x.com");
        assert_eq!(session.pending_state, None);
        assert_eq!(provider.exchange_calls(), 1);
        assert_eq!(provider.profile_calls(), 1);
    }

    #[tokio::test]
    async fn test_repeat_login_updates_same_user() {
        let provider = Arc::new(MockIdentityProvider::new(UserProfile {
            provider_id: Some("g1".to_string()),
            email: "a@x.com".to_string(),
            name: Some("Ann".to_string()),
            picture_url: Some("http://pics.example.com/a".to_string()),
        }));
        let authenticator = authenticator_with(Arc::clone(&provider)).await;

        let mut session = SessionData::default();
        authenticator.begin_login(&mut session);
        let state = session.pending_state.clone().unwrap();
        let first = authenticator
            .handle_callback(&mut session, &callback(Some("abc"), Some(&state)))
            .await
            .unwrap();

        provider.set_profile(UserProfile {
            provider_id: Some("g1".to_string()),
            email: "a@x.com".to_string(),
            name: Some("Ann Updated".to_string()),
            picture_url: Some("http://pics.example.com/a".to_string()),
        });

        let mut session = SessionData::default();
        authenticator.begin_login(&mut session);
        let state = session.pending_state.clone().unwrap();
        let second = authenticator
            .handle_callback(&mut session, &callback(Some("def"), Some(&state)))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.name.as_deref(), Some("Ann Updated"));
    }

    #[tokio::test]
    async fn test_missing_code_fails_without_provider_call() {
        let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
        let authenticator = authenticator_with(Arc::clone(&provider)).await;
        let mut session = SessionData::default();

        authenticator.begin_login(&mut session);
        let state = session.pending_state.clone().unwrap();

        let result = authenticator
            .handle_callback(&mut session, &callback(None, Some(&state)))
            .await;

        assert!(matches!(result, Err(AuthError::MissingCode)));
        assert_eq!(session.pending_state, None);
        assert_eq!(provider.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_state_fails_without_provider_call() {
        let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
        let authenticator = authenticator_with(Arc::clone(&provider)).await;
        let mut session = SessionData::default();

        authenticator.begin_login(&mut session);
        let user_before = session.user.clone();

        let result = authenticator
            .handle_callback(&mut session, &callback(Some("abc"), Some("wrong")))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidState)));
        assert_eq!(session.user, user_before);
        assert_eq!(session.pending_state, None);
        assert_eq!(provider.exchange_calls(), 0);
        assert_eq!(provider.profile_calls(), 0);
    }

    #[tokio::test]
    async fn test_callback_without_pending_token_fails() {
        let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
        let authenticator = authenticator_with(Arc::clone(&provider)).await;
        let mut session = SessionData::default();

        let result = authenticator
            .handle_callback(&mut session, &callback(Some("abc"), Some("anything")))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidState)));
        assert_eq!(provider.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn test_state_is_single_use_even_after_mismatch() {
        let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
        let authenticator = authenticator_with(Arc::clone(&provider)).await;
        let mut session = SessionData::default();

        authenticator.begin_login(&mut session);
        let state = session.pending_state.clone().unwrap();

        // First attempt with a bad state consumes the pending token
        let _ = authenticator
            .handle_callback(&mut session, &callback(Some("abc"), Some("wrong")))
            .await;

        // Replaying the genuine state afterwards must not succeed
        let replay = authenticator
            .handle_callback(&mut session, &callback(Some("abc"), Some(&state)))
            .await;
        assert!(matches!(replay, Err(AuthError::InvalidState)));
        assert_eq!(provider.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_denial_maps_to_denied_error() {
        let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
        let authenticator = authenticator_with(Arc::clone(&provider)).await;
        let mut session = SessionData::default();

        authenticator.begin_login(&mut session);
        let params = CallbackParams {
            code: None,
            state: None,
            error: Some("access_denied".to_string()),
        };

        let result = authenticator.handle_callback(&mut session, &params).await;
        match result {
            Err(AuthError::Provider(ProviderError::Denied(msg))) => {
                assert_eq!(msg, "access_denied");
            }
            other => panic!("expected Denied, got {other:?}"),
        }
        assert_eq!(session.pending_state, None);
        assert_eq!(provider.exchange_calls(), 0);
    }

    #[tokio::test]
    async fn test_exchange_failure_leaves_session_clean() {
        let provider = Arc::new(
            MockIdentityProvider::new(TestFixtures::profile())
                .with_exchange_error(ProviderError::Exchange("boom".to_string())),
        );
        let authenticator = authenticator_with(Arc::clone(&provider)).await;
        let mut session = SessionData::default();

        authenticator.begin_login(&mut session);
        let state = session.pending_state.clone().unwrap();

        let result = authenticator
            .handle_callback(&mut session, &callback(Some("abc"), Some(&state)))
            .await;

        assert!(matches!(
            result,
            Err(AuthError::Provider(ProviderError::Exchange(_)))
        ));
        assert_eq!(session.pending_state, None);
        assert_eq!(session.user, None);
    }

    #[tokio::test]
    async fn test_profile_fetch_failure_maps_to_profile_error() {
        let provider = Arc::new(
            MockIdentityProvider::new(TestFixtures::profile())
                .with_profile_error(ProviderError::MissingEmail),
        );
        let authenticator = authenticator_with(Arc::clone(&provider)).await;
        let mut session = SessionData::default();

        authenticator.begin_login(&mut session);
        let state = session.pending_state.clone().unwrap();

        let result = authenticator
            .handle_callback(&mut session, &callback(Some("abc"), Some(&state)))
            .await;

        assert!(matches!(
            result,
            Err(AuthError::Provider(ProviderError::MissingEmail))
        ));
        assert_eq!(session.user, None);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let provider = Arc::new(MockIdentityProvider::new(TestFixtures::profile()));
        let authenticator = authenticator_with(Arc::clone(&provider)).await;
        let mut session = SessionData::default();

        authenticator.begin_login(&mut session);
        let state = session.pending_state.clone().unwrap();
        authenticator
            .handle_callback(&mut session, &callback(Some("abc"), Some(&state)))
            .await
            .unwrap();
        assert!(session.is_authenticated());

        authenticator.logout(&mut session);
        assert_eq!(session.pending_state, None);
        assert_eq!(session.user, None);
        assert_eq!(authenticator.authenticated_user(&session), None);
    }

    #[test]
    fn test_error_codes_are_url_safe() {
        let errors = [
            AuthError::MissingCode,
            AuthError::InvalidState,
            AuthError::Provider(ProviderError::Denied("x".to_string())),
            AuthError::Provider(ProviderError::Exchange("x".to_string())),
            AuthError::Provider(ProviderError::ProfileFetch("x".to_string())),
            AuthError::Provider(ProviderError::MissingEmail),
            AuthError::Unauthorized,
        ];
        for error in errors {
            assert!(error
                .code()
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
