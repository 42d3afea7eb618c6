//! Unified testing utilities
//!
//! Consolidates fixtures and mocks for unit tests and the feature-gated
//! integration tests.
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built test data (settings, stores, profiles)
//! - [`mock`] - Mock identity provider with call counters

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::MockIdentityProvider;

/// Common test constants
pub mod constants {
    /// Default test email address
    pub const TEST_EMAIL: &str = "a@x.com";

    /// Default test user name
    pub const TEST_USER_NAME: &str = "Ann";

    /// Default test provider subject identifier
    pub const TEST_PROVIDER_ID: &str = "g1";

    /// Default test picture URL
    pub const TEST_PICTURE_URL: &str = "http://pics.example.com/ann.png";

    /// Test session-signing key (256 bits)
    pub const TEST_SESSION_KEY: &[u8] = b"test_key_32_bytes_long_for_test_";
}
