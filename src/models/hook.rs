//! Notification hooks that alert configurations deliver to.

use super::require;
use crate::core::config::redact;
use crate::core::{HookId, MetricsAdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fields shared by every hook kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookCommon {
    /// Assigned by the service on creation
    pub id: Option<HookId>,
    pub name: String,
    pub description: Option<String>,
    pub external_link: Option<String>,
    pub admins: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailNotificationHook {
    pub emails_to_alert: Vec<String>,
}

/// Webhook delivery target. Credentials are redacted from `Debug`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebNotificationHook {
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub certificate_key: Option<String>,
    pub certificate_password: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl fmt::Debug for WebNotificationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebNotificationHook")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_deref().map(redact))
            .field("certificate_key", &self.certificate_key.as_deref().map(redact))
            .field(
                "certificate_password",
                &self.certificate_password.as_deref().map(redact),
            )
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A hook, tagged by delivery kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "hook_type", rename_all = "snake_case")]
pub enum NotificationHook {
    Email {
        #[serde(flatten)]
        common: HookCommon,
        #[serde(flatten)]
        email: EmailNotificationHook,
    },
    Web {
        #[serde(flatten)]
        common: HookCommon,
        #[serde(flatten)]
        web: WebNotificationHook,
    },
}

impl NotificationHook {
    /// Email hook with the given recipients
    pub fn email<I, S>(name: impl Into<String>, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NotificationHook::Email {
            common: HookCommon {
                name: name.into(),
                ..HookCommon::default()
            },
            email: EmailNotificationHook {
                emails_to_alert: emails.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Webhook posting to `endpoint`
    pub fn web(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        NotificationHook::Web {
            common: HookCommon {
                name: name.into(),
                ..HookCommon::default()
            },
            web: WebNotificationHook {
                endpoint: endpoint.into(),
                ..WebNotificationHook::default()
            },
        }
    }

    pub fn common(&self) -> &HookCommon {
        match self {
            NotificationHook::Email { common, .. } | NotificationHook::Web { common, .. } => common,
        }
    }

    pub fn common_mut(&mut self) -> &mut HookCommon {
        match self {
            NotificationHook::Email { common, .. } | NotificationHook::Web { common, .. } => common,
        }
    }

    pub fn id(&self) -> Option<&HookId> {
        self.common().id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    /// Copy with all secrets removed, as the service returns hooks
    pub fn redacted(&self) -> Self {
        match self {
            NotificationHook::Email { .. } => self.clone(),
            NotificationHook::Web { common, web } => NotificationHook::Web {
                common: common.clone(),
                web: WebNotificationHook {
                    password: None,
                    certificate_key: None,
                    certificate_password: None,
                    ..web.clone()
                },
            },
        }
    }

    /// Restore web hook secrets left unset, as in a [`redacted`](Self::redacted)
    /// copy, from the stored hook.
    pub fn keep_secrets_from(&mut self, stored: &NotificationHook) {
        if let (NotificationHook::Web { web, .. }, NotificationHook::Web { web: stored, .. }) = (self, stored) {
            if web.password.is_none() {
                web.password = stored.password.clone();
            }
            if web.certificate_key.is_none() {
                web.certificate_key = stored.certificate_key.clone();
            }
            if web.certificate_password.is_none() {
                web.certificate_password = stored.certificate_password.clone();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("hook name", &self.common().name)?;
        match self {
            NotificationHook::Email { email, .. } => {
                if email.emails_to_alert.is_empty() {
                    return Err(MetricsAdvisorError::validation(
                        "email hook needs at least one recipient",
                    ));
                }
                if let Some(bad) = email.emails_to_alert.iter().find(|e| !is_plausible_email(e)) {
                    return Err(MetricsAdvisorError::validation(format!(
                        "'{}' is not a valid email address",
                        bad
                    )));
                }
                Ok(())
            },
            NotificationHook::Web { web, .. } => {
                require("webhook endpoint", &web.endpoint)?;
                if !web.endpoint.starts_with("https://") && !web.endpoint.starts_with("http://") {
                    return Err(MetricsAdvisorError::validation(format!(
                        "webhook endpoint must be an http(s) URL, got '{}'",
                        web.endpoint
                    )));
                }
                Ok(())
            },
        }
    }
}

fn is_plausible_email(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_hook_validation() {
        assert!(NotificationHook::email("ops", ["ops@contoso.com"]).validate().is_ok());
        assert!(NotificationHook::email("ops", Vec::<String>::new()).validate().is_err());
        assert!(NotificationHook::email("ops", ["not-an-email"]).validate().is_err());
        assert!(NotificationHook::email("", ["ops@contoso.com"]).validate().is_err());
    }

    #[test]
    fn test_web_hook_validation() {
        assert!(NotificationHook::web("hook", "https://contoso.com/alert").validate().is_ok());
        assert!(NotificationHook::web("hook", "").validate().is_err());
        assert!(NotificationHook::web("hook", "contoso.com").validate().is_err());
    }

    #[test]
    fn test_redaction() {
        let mut hook = NotificationHook::web("hook", "https://contoso.com/alert");
        if let NotificationHook::Web { web, .. } = &mut hook {
            web.password = Some("hunter2".to_string());
        }

        assert!(!format!("{:?}", hook).contains("hunter2"));
        match hook.redacted() {
            NotificationHook::Web { web, .. } => assert!(web.password.is_none()),
            NotificationHook::Email { .. } => panic!("Expected web hook"),
        }
    }

    #[test]
    fn test_secrets_kept_from_stored() {
        let mut stored = NotificationHook::web("hook", "https://contoso.com/alert");
        if let NotificationHook::Web { web, .. } = &mut stored {
            web.password = Some("hunter2".to_string());
            web.certificate_key = Some("key".to_string());
        }

        let mut incoming = stored.redacted();
        incoming.keep_secrets_from(&stored);
        assert_eq!(incoming, stored);

        let mut rotated = stored.redacted();
        if let NotificationHook::Web { web, .. } = &mut rotated {
            web.password = Some("swordfish".to_string());
        }
        rotated.keep_secrets_from(&stored);
        match rotated {
            NotificationHook::Web { web, .. } => {
                assert_eq!(web.password.as_deref(), Some("swordfish"));
                assert_eq!(web.certificate_key.as_deref(), Some("key"));
            }
            NotificationHook::Email { .. } => panic!("Expected web hook"),
        }
    }

    #[test]
    fn test_serialized_tag() {
        let json = serde_json::to_value(NotificationHook::email("ops", ["ops@contoso.com"])).unwrap();
        assert_eq!(json["hook_type"], "email");
        assert_eq!(json["name"], "ops");
    }
}
