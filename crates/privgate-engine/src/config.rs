//! Engine configuration

use privgate_types::ProfileTemplate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::grants::validate_timeframe;

/// Configuration for the policy engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Lifetime of "allow once" grants, in seconds
    #[serde(default = "default_grant_timeframe")]
    pub ask_grant_timeframe_secs: u64,

    /// Profile installed on first start when the store has none
    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    /// Templates available for installation by name, in addition to the
    /// built-in ones
    #[serde(default)]
    pub templates: Vec<ProfileTemplate>,

    /// How long a consent prompt may stay unanswered before it is denied
    #[serde(default = "default_prompt_timeout")]
    pub prompt_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ask_grant_timeframe_secs: default_grant_timeframe(),
            default_profile: default_profile_name(),
            templates: Vec::new(),
            prompt_timeout_secs: default_prompt_timeout(),
        }
    }
}

impl EngineConfig {
    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        validate_timeframe(self.ask_grant_timeframe())?;
        if self.prompt_timeout_secs == 0 {
            return Err(EngineError::InvalidRequest(
                "prompt timeout must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn ask_grant_timeframe(&self) -> Duration {
        Duration::from_secs(self.ask_grant_timeframe_secs)
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }

    /// Look a template up by name; configured templates shadow built-ins
    pub fn template(&self, name: &str) -> Option<ProfileTemplate> {
        self.templates
            .iter()
            .chain(builtin_templates().iter())
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Template for the default profile
    ///
    /// Falls back to an empty template (every access asked) when the
    /// configured name matches no template.
    pub fn default_template(&self) -> ProfileTemplate {
        self.template(&self.default_profile).unwrap_or_else(|| {
            ProfileTemplate::new(self.default_profile.clone(), "Ask before every sensitive access")
        })
    }
}

fn builtin_templates() -> &'static [ProfileTemplate] {
    static BUILTIN: std::sync::OnceLock<Vec<ProfileTemplate>> = std::sync::OnceLock::new();
    BUILTIN.get_or_init(|| {
        vec![
            ProfileTemplate::default_profile(),
            ProfileTemplate::organizational(),
        ]
    })
}

// Default value helpers
fn default_grant_timeframe() -> u64 {
    300
}

fn default_profile_name() -> String {
    "Default".to_string()
}

fn default_prompt_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.ask_grant_timeframe(), Duration::from_secs(300));
        assert_eq!(config.default_profile, "Default");
        assert_eq!(config.default_template().name, "Default");
        assert!(config.default_template().rules.is_empty());
    }

    #[test]
    fn test_validate_bounds_timeframe() {
        assert!(EngineConfig::default().validate().is_ok());

        let huge = EngineConfig {
            ask_grant_timeframe_secs: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(EngineError::InvalidRequest(_))));

        let zero = EngineConfig {
            ask_grant_timeframe_secs: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_builtin_lookup_is_case_insensitive() {
        let config = EngineConfig::default();
        let org = config.template("organizational").unwrap();
        assert_eq!(org.name, "Organizational");
        assert!(config.template("Nonexistent").is_none());
    }

    #[test]
    fn test_configured_template_shadows_builtin() {
        let config = EngineConfig {
            templates: vec![ProfileTemplate::new("Default", "custom")],
            ..Default::default()
        };
        assert_eq!(config.default_template().description, "custom");
    }

    #[test]
    fn test_unknown_default_falls_back_to_empty() {
        let config = EngineConfig {
            default_profile: "Family".into(),
            ..Default::default()
        };
        let template = config.default_template();
        assert_eq!(template.name, "Family");
        assert!(template.rules.is_empty());
    }

    #[test]
    fn test_partial_config_deserializes() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"ask_grant_timeframe_secs": 60}"#).unwrap();
        assert_eq!(config.ask_grant_timeframe_secs, 60);
        assert_eq!(config.prompt_timeout_secs, 60);
        assert_eq!(config.default_profile, "Default");
    }
}
