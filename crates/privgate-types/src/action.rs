//! Decision vocabulary
//!
//! [`Action`] is what a policy says, [`Verdict`] is what a request source
//! receives, and [`UserChoice`] is what the consent UI answers with.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome stored in a policy entry or produced by resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allow,
    Deny,
    Ask,
}

impl Action {
    pub fn is_allow(&self) -> bool {
        matches!(self, Action::Allow)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Action::Deny)
    }

    pub fn is_ask(&self) -> bool {
        matches!(self, Action::Ask)
    }

    /// Terminal form of this action, if it has one
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Action::Allow => Some(Verdict::Allow),
            Action::Deny => Some(Verdict::Deny),
            Action::Ask => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Allow => write!(f, "allow"),
            Action::Deny => write!(f, "deny"),
            Action::Ask => write!(f, "ask"),
        }
    }
}

/// How long a recorded decision lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// Ephemeral grant held in memory until it expires
    Once,
    /// Persisted policy entry under the active profile
    Always,
}

/// Terminal answer delivered to a request source. Never `Ask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    Deny,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

impl From<Verdict> for Action {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Allow => Action::Allow,
            Verdict::Deny => Action::Deny,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Action::from(*self).fmt(f)
    }
}

/// Answer to a consent prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserChoice {
    AllowOnce,
    AlwaysAllow,
    AlwaysDeny,
}

impl UserChoice {
    /// The action and durability this choice records
    pub fn decision(&self) -> (Action, Durability) {
        match self {
            UserChoice::AllowOnce => (Action::Allow, Durability::Once),
            UserChoice::AlwaysAllow => (Action::Allow, Durability::Always),
            UserChoice::AlwaysDeny => (Action::Deny, Durability::Always),
        }
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            UserChoice::AllowOnce | UserChoice::AlwaysAllow => Verdict::Allow,
            UserChoice::AlwaysDeny => Verdict::Deny,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_has_no_verdict() {
        assert_eq!(Action::Allow.verdict(), Some(Verdict::Allow));
        assert_eq!(Action::Deny.verdict(), Some(Verdict::Deny));
        assert!(Action::Ask.verdict().is_none());
    }

    #[test]
    fn user_choice_decisions() {
        assert_eq!(
            UserChoice::AllowOnce.decision(),
            (Action::Allow, Durability::Once)
        );
        assert_eq!(
            UserChoice::AlwaysDeny.decision(),
            (Action::Deny, Durability::Always)
        );
        assert!(!UserChoice::AlwaysDeny.verdict().is_allowed());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&UserChoice::AlwaysAllow).unwrap();
        assert_eq!(json, "\"always_allow\"");
        let action: Action = serde_json::from_str("\"deny\"").unwrap();
        assert_eq!(action, Action::Deny);
    }
}
