//! End-to-end tests for HawkStack.
//!
//! Clients and servers run in-process against a shared manual clock, so
//! every scenario is deterministic. Run them with:
//! ```text
//! cargo test -p hawkstack-integration
//! ```
//!
//! Set `RUST_LOG=hawkstack_auth=debug` to see authentication diagnostics.

use std::sync::{Arc, Once};

use hawkstack_auth::client::Client;
use hawkstack_auth::credentials::{Credentials, StaticCredentialProvider};
use hawkstack_auth::replay::FreshnessGuard;
use hawkstack_auth::server::Server;
use hawkstack_core::{Algorithm, HawkConfig, InMemoryNonceStore, ManualClock, Timestamp};
use rand::RngExt;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        let fallback = HawkConfig::from_env()
            .map(|config| config.log_level)
            .unwrap_or_else(|_| "warn".to_owned());
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
            )
            .with_test_writer()
            .init();
    });
}

/// Credential identifier used throughout the scenarios.
pub const ID: &str = "dh37fgj492je";

/// Timestamp the scenarios start at.
pub const START: Timestamp = 1353832234;

/// Skew window of the test servers, in seconds.
pub const WINDOW: u64 = 60;

/// Generate a random 32-byte key.
#[must_use]
pub fn random_key() -> Vec<u8> {
    let mut rng = rand::rng();
    let mut key = [0u8; 32];
    rng.fill(&mut key);
    key.to_vec()
}

/// A client and a server sharing credentials and a manual clock.
#[derive(Debug)]
pub struct Fixture {
    /// Clock read by both sides.
    pub clock: Arc<ManualClock>,
    /// Credentials known to the server and used by the client.
    pub credentials: Credentials,
    /// The signing side.
    pub client: Client,
    /// The verifying side.
    pub server: Server,
}

/// Create a fixture with random SHA-256 credentials, starting at [`START`].
#[must_use]
pub fn fixture() -> Fixture {
    fixture_for(Algorithm::Sha256)
}

/// Create a fixture with random credentials for `algorithm`.
#[must_use]
pub fn fixture_for(algorithm: Algorithm) -> Fixture {
    fixture_with(Credentials::new(ID, random_key(), algorithm))
}

/// Create a fixture around the given credentials, starting at [`START`].
#[must_use]
pub fn fixture_with(credentials: Credentials) -> Fixture {
    init_tracing();

    let clock = Arc::new(ManualClock::new(START));
    let client = Client::new(credentials.clone()).with_clock(clock.clone());
    let server = Server::new(
        Arc::new(StaticCredentialProvider::new(vec![credentials.clone()])),
        FreshnessGuard::new(Arc::new(InMemoryNonceStore::new()), WINDOW),
    )
    .with_clock(clock.clone());

    Fixture {
        clock,
        credentials,
        client,
        server,
    }
}

mod test_bewit;
mod test_end_to_end;
mod test_replay;
mod test_resync;
mod test_tamper;
