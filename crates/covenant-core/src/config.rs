//! Controller configuration
//!
//! Loaded from TOML, optionally overridden from `COVENANT_CONTROLLER_*`
//! environment variables, then validated before a controller is built.
//!
//! ```toml
//! address = "0x00000000000000000000000000000000000000c0"
//! deployer = "0x00000000000000000000000000000000000000d0"
//! max_constraints_per_phase = 32
//! ```

use crate::errors::{CovenantError, CovenantResult};
use crate::identifiers::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "COVENANT_CONTROLLER_";

/// Configuration of one controller instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Identity of the controller itself; collaborators see it as the caller
    pub address: Address,
    /// Principal pre-registered with every permission
    pub deployer: Address,
    /// Upper bound on entries per constraint collection; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_constraints_per_phase: Option<usize>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            address: Address::derive(b"covenant/controller"),
            deployer: Address::derive(b"covenant/deployer"),
            max_constraints_per_phase: None,
        }
    }
}

impl ControllerConfig {
    /// Create a configuration with no constraint capacity bound
    pub fn new(address: Address, deployer: Address) -> Self {
        Self {
            address,
            deployer,
            max_constraints_per_phase: None,
        }
    }

    /// Bound the number of entries per constraint collection
    pub fn with_constraint_capacity(mut self, capacity: usize) -> Self {
        self.max_constraints_per_phase = Some(capacity);
        self
    }

    /// Parse from a TOML document
    pub fn from_toml_str(text: &str) -> CovenantResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> CovenantResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CovenantError::invalid(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded controller configuration");
        Ok(config)
    }

    /// Apply `COVENANT_CONTROLLER_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> CovenantResult<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs; unrelated names are ignored
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> CovenantResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match field {
                "ADDRESS" => self.address = value.parse()?,
                "DEPLOYER" => self.deployer = value.parse()?,
                "MAX_CONSTRAINTS_PER_PHASE" => {
                    let capacity = value.parse::<usize>().map_err(|e| {
                        CovenantError::invalid(format!(
                            "{ENV_PREFIX}{field} must be an integer: {e}"
                        ))
                    })?;
                    self.max_constraints_per_phase = Some(capacity);
                }
                other => {
                    tracing::warn!(variable = %format!("{ENV_PREFIX}{other}"), "ignoring unknown override");
                }
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CovenantResult<()> {
        if self.address.is_zero() {
            return Err(CovenantError::invalid("controller address must be non-zero"));
        }
        if self.deployer.is_zero() {
            return Err(CovenantError::invalid("deployer address must be non-zero"));
        }
        if self.address == self.deployer {
            return Err(CovenantError::invalid(
                "controller address and deployer must differ",
            ));
        }
        if self.max_constraints_per_phase == Some(0) {
            return Err(CovenantError::invalid(
                "max_constraints_per_phase must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
address = "0x00000000000000000000000000000000000000c0"
deployer = "0x00000000000000000000000000000000000000d0"
max_constraints_per_phase = 4
"#;

    #[test]
    fn parses_toml() {
        let config = ControllerConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.address, Address::from_low_u64(0xc0));
        assert_eq!(config.deployer, Address::from_low_u64(0xd0));
        assert_eq!(config.max_constraints_per_phase, Some(4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn capacity_is_optional() {
        let text = r#"
address = "0x00000000000000000000000000000000000000c0"
deployer = "0x00000000000000000000000000000000000000d0"
"#;
        let config = ControllerConfig::from_toml_str(text).unwrap();
        assert_eq!(config.max_constraints_per_phase, None);
    }

    #[test]
    fn rejects_unknown_fields() {
        let text = format!("{SAMPLE}\ncolour = \"blue\"\n");
        assert!(ControllerConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = ControllerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.max_constraints_per_phase, Some(4));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ControllerConfig::default();
        config
            .merge_with_vars([
                (
                    "COVENANT_CONTROLLER_DEPLOYER",
                    "0x00000000000000000000000000000000000000aa",
                ),
                ("COVENANT_CONTROLLER_MAX_CONSTRAINTS_PER_PHASE", "2"),
                ("UNRELATED", "ignored"),
            ])
            .unwrap();
        assert_eq!(config.deployer, Address::from_low_u64(0xaa));
        assert_eq!(config.max_constraints_per_phase, Some(2));
    }

    #[test]
    fn process_environment_overrides_file_values() {
        let variable = format!("{ENV_PREFIX}MAX_CONSTRAINTS_PER_PHASE");
        std::env::set_var(&variable, "9");
        let mut config = ControllerConfig::from_toml_str(SAMPLE).unwrap();
        let merged = config.merge_with_env();
        std::env::remove_var(&variable);
        merged.unwrap();
        assert_eq!(config.max_constraints_per_phase, Some(9));
        assert_eq!(config.address, Address::from_low_u64(0xc0));
    }

    #[test]
    fn env_override_rejects_garbage() {
        let mut config = ControllerConfig::default();
        let err = config
            .merge_with_vars([("COVENANT_CONTROLLER_MAX_CONSTRAINTS_PER_PHASE", "many")])
            .unwrap_err();
        assert!(matches!(err, CovenantError::Invalid { .. }));
    }

    #[test]
    fn validation_rules() {
        assert!(ControllerConfig::default().validate().is_ok());
        let a = Address::from_low_u64(1);
        assert!(ControllerConfig::new(Address::ZERO, a).validate().is_err());
        assert!(ControllerConfig::new(a, Address::ZERO).validate().is_err());
        assert!(ControllerConfig::new(a, a).validate().is_err());
        assert!(ControllerConfig::new(a, Address::from_low_u64(2))
            .with_constraint_capacity(0)
            .validate()
            .is_err());
    }
}
