//! Configuration loading from the environment

use anyhow::{anyhow, bail, Result};

use crate::tap::TapLocation;

/// Whether the Accessibility check may show the system prompt
const PROMPT_VAR: &str = "HJKL_ARROWS_PROMPT";
/// Tap location, `hid` or `session`
const TAP_VAR: &str = "HJKL_ARROWS_TAP";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prompt the user to grant Accessibility permission if missing
    pub prompt_for_access: bool,

    /// Where the event tap is installed
    pub tap_location: TapLocation,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt_for_access: true,
            tap_location: TapLocation::Hid,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(PROMPT_VAR) {
            config.prompt_for_access = parse_bool(PROMPT_VAR, &raw)?;
        }
        if let Some(raw) = lookup(TAP_VAR) {
            config.tap_location = raw.parse().map_err(|e| anyhow!("{TAP_VAR}: {e}"))?;
        }

        Ok(config)
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{name}: expected a boolean, got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.prompt_for_access);
        assert_eq!(config.tap_location, TapLocation::Hid);
    }

    #[test]
    fn test_config_overrides() {
        let config = load_with(&[(PROMPT_VAR, "off"), (TAP_VAR, "session")]).unwrap();
        assert!(!config.prompt_for_access);
        assert_eq!(config.tap_location, TapLocation::Session);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let err = load_with(&[(PROMPT_VAR, "maybe")]).unwrap_err();
        assert!(err.to_string().contains(PROMPT_VAR));

        let err = load_with(&[(TAP_VAR, "annotated")]).unwrap_err();
        assert!(err.to_string().contains(TAP_VAR));
    }
}
