//! Profile templates: canonical bundles installed as a new profile

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::entry::{PolicyEntry, Profile};
use crate::error::{PolicyError, Result};
use crate::scope::{ScopeDraft, APP_ALL};
use crate::taxonomy::{Taxonomy, LIBRARY_ALL, PURPOSE_ALL};

/// One rule of a template. Omitted fields mean the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRule {
    #[serde(default)]
    pub app: Option<String>,
    pub permission: String,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub library: Option<String>,
    pub action: Action,
}

impl TemplateRule {
    /// Rule applying to every app
    pub fn everywhere(permission: impl Into<String>, action: Action) -> Self {
        Self {
            app: None,
            permission: permission.into(),
            purpose: None,
            library: None,
            action,
        }
    }

    pub fn for_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    fn draft(&self) -> ScopeDraft {
        ScopeDraft {
            app: Some(self.app.clone().unwrap_or_else(|| APP_ALL.to_string())),
            permission: Some(self.permission.clone()),
            purpose: Some(self.purpose.clone().unwrap_or_else(|| PURPOSE_ALL.to_string())),
            library: Some(self.library.clone().unwrap_or_else(|| LIBRARY_ALL.to_string())),
        }
    }
}

/// A named bundle of rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<TemplateRule>,
}

impl ProfileTemplate {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: TemplateRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Empty profile: every request is asked
    pub fn default_profile() -> Self {
        Self::new("Default", "Ask before every sensitive access")
    }

    /// Managed-device profile blocking tracking by third parties
    pub fn organizational() -> Self {
        Self::new(
            "Organizational",
            "Blocks third-party advertising and analytics access to sensitive data",
        )
        .rule(
            TemplateRule::everywhere("FINE_LOCATION", Action::Deny)
                .purpose("DISPLAY_ADVERTISEMENT")
                .library("THIRD_PARTY_USE"),
        )
        .rule(
            TemplateRule::everywhere("COARSE_LOCATION", Action::Deny)
                .purpose("DISPLAY_ADVERTISEMENT")
                .library("THIRD_PARTY_USE"),
        )
        .rule(
            TemplateRule::everywhere("CONTACTS", Action::Deny)
                .purpose("ANALYTICS")
                .library("THIRD_PARTY_USE"),
        )
        .rule(
            TemplateRule::everywhere("PHONE_STATE", Action::Deny)
                .purpose("ANALYTICS")
                .library("THIRD_PARTY_USE"),
        )
        .rule(TemplateRule::everywhere("CALL_LOG", Action::Deny))
        .rule(TemplateRule::everywhere("SMS", Action::Deny))
    }

    /// Entries tagged with this template's name, stamped `now`
    ///
    /// The whole template is rejected if any rule is invalid.
    pub fn materialize(&self, taxonomy: &Taxonomy, now: DateTime<Utc>) -> Result<Vec<PolicyEntry>> {
        if self.name.trim().is_empty() {
            return Err(PolicyError::malformed("profile template has no name"));
        }
        Profile::validate_name(&self.name)?;
        self.rules
            .iter()
            .map(|rule| {
                let scope = rule.draft().build(taxonomy)?;
                let entry = PolicyEntry::new(self.name.clone(), scope, rule.action, now);
                entry.validate()?;
                Ok(entry)
            })
            .collect()
    }
}
