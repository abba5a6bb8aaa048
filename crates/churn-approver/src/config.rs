//! Service configuration with validation.

use crate::domain::approval::SignerKeyError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Churn approval service configuration.
///
/// The approval validity window is a fixed protocol constant
/// (`approval::APPROVAL_TTL`) and deliberately absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    /// Hex-encoded secp256k1 private key used to sign approvals.
    /// The recovered address must match the approver the on-chain
    /// registry trusts.
    pub signer_private_key_hex: String,

    /// Minimum interval between churn requests from one operator. Applies
    /// whether or not the earlier request succeeded.
    pub per_operator_cooldown: Duration,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            signer_private_key_hex: String::new(),
            per_operator_cooldown: Duration::from_secs(15 * 60),
        }
    }
}

impl ChurnConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signer_private_key_hex.trim().is_empty() {
            return Err(ConfigError::MissingSignerKey);
        }
        if self.per_operator_cooldown.is_zero() {
            return Err(ConfigError::InvalidCooldown);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("signer private key is not configured")]
    MissingSignerKey,

    #[error("signer private key is invalid: {0}")]
    InvalidSignerKey(#[from] SignerKeyError),

    #[error("per-operator cooldown cannot be zero")]
    InvalidCooldown,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    #[test]
    fn default_config_lacks_a_signer_key() {
        let config = ChurnConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSignerKey)
        ));
    }

    #[test]
    fn configured_key_and_cooldown_validate() {
        let config = ChurnConfig {
            signer_private_key_hex: TEST_KEY.to_string(),
            per_operator_cooldown: Duration::from_secs(60),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_cooldown_is_rejected() {
        let config = ChurnConfig {
            signer_private_key_hex: TEST_KEY.to_string(),
            per_operator_cooldown: Duration::ZERO,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCooldown)
        ));
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = ChurnConfig {
            signer_private_key_hex: TEST_KEY.to_string(),
            per_operator_cooldown: Duration::from_secs(90),
        };

        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: ChurnConfig = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.signer_private_key_hex, config.signer_private_key_hex);
        assert_eq!(decoded.per_operator_cooldown, config.per_operator_cooldown);
    }
}
