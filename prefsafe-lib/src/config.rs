//! Configuration for opening a secure store.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{PrefsafeError, Result};

/// How typed values are turned into text before encryption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueEncoding {
    /// Untagged numbers, `boolean(..)` and `string_set[..]` envelopes.
    /// Types are recovered by parse order on read.
    #[default]
    Heuristic,
    /// Explicit, length-prefixed type tag on every value. Values written
    /// without the tag are still read with the heuristic.
    Tagged,
}

impl ValueEncoding {
    /// Name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Tagged => "tagged",
        }
    }
}

/// Settings for [`open_with_config`](crate::open_with_config).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Name of the plain preference store holding the ciphertext.
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// Key-store alias of the backing key (or key pair).
    #[serde(default = "default_key_alias")]
    pub key_alias: String,

    /// Certificate serial number of generated keys.
    #[serde(default = "default_serial_number")]
    pub serial_number: u64,

    /// Validity window of generated keys, in years from creation.
    #[serde(default = "default_validity_years")]
    pub validity_years: u32,

    /// Modulus size of the legacy RSA key pair.
    #[serde(default = "default_rsa_key_size")]
    pub rsa_key_size: usize,

    /// Lowest host capability level that gets the AES-GCM backend.
    #[serde(default = "default_modern_capability_level")]
    pub modern_capability_level: u32,

    /// Side store holding the wrapped master key of the legacy backend.
    #[serde(default = "default_side_store_name")]
    pub side_store_name: String,

    /// Entry name of the wrapped master key inside the side store.
    #[serde(default = "default_master_key_entry")]
    pub master_key_entry: String,

    /// Value text encoding.
    #[serde(default)]
    pub value_encoding: ValueEncoding,
}

fn default_store_name() -> String {
    "default".to_string()
}

fn default_key_alias() -> String {
    "SecurityModuleAlias".to_string()
}

fn default_serial_number() -> u64 {
    1
}

fn default_validity_years() -> u32 {
    40
}

fn default_rsa_key_size() -> usize {
    2048
}

fn default_modern_capability_level() -> u32 {
    23
}

fn default_side_store_name() -> String {
    "SECURITY_PREFS".to_string()
}

fn default_master_key_entry() -> String {
    ".security_master_prefs_key".to_string()
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            store_name: default_store_name(),
            key_alias: default_key_alias(),
            serial_number: default_serial_number(),
            validity_years: default_validity_years(),
            rsa_key_size: default_rsa_key_size(),
            modern_capability_level: default_modern_capability_level(),
            side_store_name: default_side_store_name(),
            master_key_entry: default_master_key_entry(),
            value_encoding: ValueEncoding::default(),
        }
    }
}

impl SecurityConfig {
    /// Create a configuration with defaults for the named store.
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PrefsafeError::Config(format!("cannot parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PrefsafeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Set the key alias.
    pub fn with_key_alias(mut self, alias: impl Into<String>) -> Self {
        self.key_alias = alias.into();
        self
    }

    /// Set the RSA modulus size of the legacy backend.
    pub fn with_rsa_key_size(mut self, bits: usize) -> Self {
        self.rsa_key_size = bits;
        self
    }

    /// Set the capability level from which the AES-GCM backend is used.
    pub fn with_modern_capability_level(mut self, level: u32) -> Self {
        self.modern_capability_level = level;
        self
    }

    /// Set the validity window of generated keys.
    pub fn with_validity_years(mut self, years: u32) -> Self {
        self.validity_years = years;
        self
    }

    /// Set the value text encoding.
    pub fn with_value_encoding(mut self, encoding: ValueEncoding) -> Self {
        self.value_encoding = encoding;
        self
    }

    /// Check the configuration for values no backend can work with.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("store_name", &self.store_name),
            ("key_alias", &self.key_alias),
            ("side_store_name", &self.side_store_name),
            ("master_key_entry", &self.master_key_entry),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(PrefsafeError::Config(format!("{} must not be empty", field)));
            }
        }
        if self.side_store_name == self.store_name {
            return Err(PrefsafeError::Config(
                "side_store_name must differ from store_name".to_string(),
            ));
        }
        if self.validity_years == 0 {
            return Err(PrefsafeError::Config(
                "validity_years must be at least 1".to_string(),
            ));
        }
        if self.rsa_key_size < 1024 {
            return Err(PrefsafeError::Config(format!(
                "rsa_key_size {} is below the 1024-bit minimum",
                self.rsa_key_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SecurityConfig::default();
        assert_eq!(config.store_name, "default");
        assert_eq!(config.key_alias, "SecurityModuleAlias");
        assert_eq!(config.serial_number, 1);
        assert_eq!(config.validity_years, 40);
        assert_eq!(config.modern_capability_level, 23);
        assert_eq!(config.master_key_entry, ".security_master_prefs_key");
        assert_eq!(config.value_encoding, ValueEncoding::Heuristic);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            SecurityConfig::from_json(r#"{"store_name": "wallet", "value_encoding": "tagged"}"#)
                .unwrap();
        assert_eq!(config.store_name, "wallet");
        assert_eq!(config.value_encoding, ValueEncoding::Tagged);
        assert_eq!(config.rsa_key_size, 2048);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(SecurityConfig::from_json(r#"{"key_alias": " "}"#).is_err());
        assert!(SecurityConfig::from_json(r#"{"validity_years": 0}"#).is_err());
        assert!(SecurityConfig::from_json(r#"{"rsa_key_size": 512}"#).is_err());
        assert!(SecurityConfig::from_json(r#"{"store_name": "SECURITY_PREFS"}"#).is_err());
        assert!(SecurityConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"key_alias": "custom"}}"#).unwrap();

        let config = SecurityConfig::from_file(file.path()).unwrap();
        assert_eq!(config.key_alias, "custom");
        assert_eq!(config.store_name, "default");
    }

    #[test]
    fn test_builders() {
        let config = SecurityConfig::new("accounts")
            .with_key_alias("alias")
            .with_rsa_key_size(1024)
            .with_modern_capability_level(30)
            .with_validity_years(5)
            .with_value_encoding(ValueEncoding::Tagged);

        assert_eq!(config.store_name, "accounts");
        assert_eq!(config.key_alias, "alias");
        assert_eq!(config.rsa_key_size, 1024);
        assert_eq!(config.modern_capability_level, 30);
        assert_eq!(config.validity_years, 5);
        assert_eq!(config.value_encoding.as_str(), "tagged");
    }
}
