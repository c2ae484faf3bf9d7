//! Unit tests for the token services


use std::sync::Arc;

use crate::repositories::InMemoryTokenStore;
use crate::services::token::{Clock, ManualClock, TokenService, TokenServiceConfig};

pub(crate) fn test_config() -> TokenServiceConfig {
    TokenServiceConfig {
        jwt_secret: "unit-test-secret".to_string(),
        device_hash_key: "unit-test-device-key".to_string(),
        ..TokenServiceConfig::default()
    }
}

pub(crate) struct TestHarness {
    pub store: Arc<InMemoryTokenStore>,
    pub clock: Arc<ManualClock>,
    pub service: TokenService<InMemoryTokenStore>,
}

pub(crate) fn harness() -> TestHarness {
    harness_with_config(test_config())
}

pub(crate) fn harness_with_config(config: TokenServiceConfig) -> TestHarness {
    let store = Arc::new(InMemoryTokenStore::new());
    let clock = Arc::new(ManualClock::starting_now());
    let dyn_clock: Arc<dyn Clock> = Arc::clone(&clock) as Arc<dyn Clock>;
    let service = TokenService::with_clock(Arc::clone(&store), config, dyn_clock);

    TestHarness {
        store,
        clock,
        service,
    }
}
