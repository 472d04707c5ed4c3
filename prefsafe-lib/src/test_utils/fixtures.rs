//! Hosts, configurations and sample values.

use std::collections::BTreeSet;

use crate::config::SecurityConfig;
use crate::host::SoftwareHost;

/// RSA modulus size used by test configurations.
pub const TEST_RSA_KEY_SIZE: usize = 1024;

/// Default configuration with a small RSA modulus.
pub fn test_config() -> SecurityConfig {
    SecurityConfig::default().with_rsa_key_size(TEST_RSA_KEY_SIZE)
}

/// In-memory host at the modern capability level.
pub fn test_host() -> SoftwareHost {
    SoftwareHost::new(test_config().modern_capability_level)
}

/// In-memory host one level below the modern capability level.
pub fn legacy_test_host() -> SoftwareHost {
    SoftwareHost::new(test_config().modern_capability_level - 1).with_identity("com.example.legacy")
}

/// Build a string set.
pub fn sample_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
