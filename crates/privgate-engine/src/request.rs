//! Raw access requests as delivered by a request source

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// An app asking for sensitive data
///
/// Names are resolved against the taxonomy by the engine. `code_origin` is
/// the qualified name of the code that made the call, if the source knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub app: String,
    pub permission: String,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub code_origin: Option<String>,
}

impl AccessRequest {
    pub fn new(app: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            permission: permission.into(),
            purpose: None,
            code_origin: None,
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn with_code_origin(mut self, origin: impl Into<String>) -> Self {
        self.code_origin = Some(origin.into());
        self
    }

    /// Requests always come from one concrete app
    pub fn validate(&self) -> Result<()> {
        let app = self.app.trim();
        if app.is_empty() {
            return Err(EngineError::InvalidRequest("missing app".into()));
        }
        if app == privgate_types::APP_ALL {
            return Err(EngineError::InvalidRequest(
                "requests must name a concrete app".into(),
            ));
        }
        if self.permission.trim().is_empty() {
            return Err(EngineError::InvalidRequest("missing permission".into()));
        }
        Ok(())
    }

    pub(crate) fn purpose_name(&self) -> Option<&str> {
        self.purpose
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub(crate) fn origin(&self) -> Option<&str> {
        self.code_origin
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_app_is_rejected() {
        assert!(AccessRequest::new("*", "CAMERA").validate().is_err());
        assert!(AccessRequest::new(" ", "CAMERA").validate().is_err());
        assert!(AccessRequest::new("A", "").validate().is_err());
        assert!(AccessRequest::new("A", "CAMERA").validate().is_ok());
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let request: AccessRequest =
            serde_json::from_str(r#"{"app": "A", "permission": "CAMERA"}"#).unwrap();
        assert_eq!(request.purpose_name(), None);
        assert_eq!(request.origin(), None);

        let blank = request.with_purpose("  ");
        assert_eq!(blank.purpose_name(), None);
    }
}
