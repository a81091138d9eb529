//! Stored credentials that data feeds authenticate with.

use super::require;
use crate::core::config::redact;
use crate::core::{CredentialId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A credential entity, tagged by authentication kind.
///
/// Secret fields are redacted from `Debug`; the service never returns them, which
/// [`DataSourceCredential::redacted`] mirrors.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "credential_type", rename_all = "snake_case")]
pub enum DataSourceCredential {
    SqlConnectionString {
        id: Option<CredentialId>,
        name: String,
        description: Option<String>,
        connection_string: String,
    },
    DataLakeGen2SharedKey {
        id: Option<CredentialId>,
        name: String,
        description: Option<String>,
        account_key: String,
    },
    ServicePrincipal {
        id: Option<CredentialId>,
        name: String,
        description: Option<String>,
        client_id: String,
        client_secret: String,
        tenant_id: String,
    },
    ServicePrincipalInKeyVault {
        id: Option<CredentialId>,
        name: String,
        description: Option<String>,
        key_vault_endpoint: String,
        key_vault_client_id: String,
        key_vault_client_secret: String,
        secret_name_for_client_id: String,
        secret_name_for_client_secret: String,
        tenant_id: String,
    },
}

impl DataSourceCredential {
    pub fn sql_connection_string(name: impl Into<String>, connection_string: impl Into<String>) -> Self {
        DataSourceCredential::SqlConnectionString {
            id: None,
            name: name.into(),
            description: None,
            connection_string: connection_string.into(),
        }
    }

    pub fn service_principal(
        name: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        DataSourceCredential::ServicePrincipal {
            id: None,
            name: name.into(),
            description: None,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
        }
    }

    pub fn id(&self) -> Option<&CredentialId> {
        match self {
            DataSourceCredential::SqlConnectionString { id, .. }
            | DataSourceCredential::DataLakeGen2SharedKey { id, .. }
            | DataSourceCredential::ServicePrincipal { id, .. }
            | DataSourceCredential::ServicePrincipalInKeyVault { id, .. } => id.as_ref(),
        }
    }

    pub(crate) fn set_id(&mut self, new_id: CredentialId) {
        match self {
            DataSourceCredential::SqlConnectionString { id, .. }
            | DataSourceCredential::DataLakeGen2SharedKey { id, .. }
            | DataSourceCredential::ServicePrincipal { id, .. }
            | DataSourceCredential::ServicePrincipalInKeyVault { id, .. } => *id = Some(new_id),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DataSourceCredential::SqlConnectionString { name, .. }
            | DataSourceCredential::DataLakeGen2SharedKey { name, .. }
            | DataSourceCredential::ServicePrincipal { name, .. }
            | DataSourceCredential::ServicePrincipalInKeyVault { name, .. } => name,
        }
    }

    /// Short kind label, e.g. for listing
    pub fn kind(&self) -> &'static str {
        match self {
            DataSourceCredential::SqlConnectionString { .. } => "sql_connection_string",
            DataSourceCredential::DataLakeGen2SharedKey { .. } => "data_lake_gen2_shared_key",
            DataSourceCredential::ServicePrincipal { .. } => "service_principal",
            DataSourceCredential::ServicePrincipalInKeyVault { .. } => {
                "service_principal_in_key_vault"
            },
        }
    }

    /// Copy with every secret blanked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            DataSourceCredential::SqlConnectionString {
                connection_string, ..
            } => connection_string.clear(),
            DataSourceCredential::DataLakeGen2SharedKey { account_key, .. } => account_key.clear(),
            DataSourceCredential::ServicePrincipal { client_secret, .. } => client_secret.clear(),
            DataSourceCredential::ServicePrincipalInKeyVault {
                key_vault_client_secret,
                ..
            } => key_vault_client_secret.clear(),
        }
        copy
    }

    /// Fill secrets left blank, as in a [`redacted`](Self::redacted) copy, from
    /// the stored credential of the same kind.
    pub fn keep_secrets_from(&mut self, stored: &DataSourceCredential) {
        fn keep(incoming: &mut String, stored: &str) {
            if incoming.is_empty() {
                *incoming = stored.to_string();
            }
        }

        match (self, stored) {
            (
                DataSourceCredential::SqlConnectionString {
                    connection_string, ..
                },
                DataSourceCredential::SqlConnectionString {
                    connection_string: stored, ..
                },
            ) => keep(connection_string, stored),
            (
                DataSourceCredential::DataLakeGen2SharedKey { account_key, .. },
                DataSourceCredential::DataLakeGen2SharedKey {
                    account_key: stored, ..
                },
            ) => keep(account_key, stored),
            (
                DataSourceCredential::ServicePrincipal { client_secret, .. },
                DataSourceCredential::ServicePrincipal {
                    client_secret: stored, ..
                },
            ) => keep(client_secret, stored),
            (
                DataSourceCredential::ServicePrincipalInKeyVault {
                    key_vault_client_secret,
                    ..
                },
                DataSourceCredential::ServicePrincipalInKeyVault {
                    key_vault_client_secret: stored,
                    ..
                },
            ) => keep(key_vault_client_secret, stored),
            _ => {},
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("credential name", self.name())?;
        match self {
            DataSourceCredential::SqlConnectionString {
                connection_string, ..
            } => require("connection_string", connection_string),
            DataSourceCredential::DataLakeGen2SharedKey { account_key, .. } => {
                require("account_key", account_key)
            },
            DataSourceCredential::ServicePrincipal {
                client_id,
                client_secret,
                tenant_id,
                ..
            } => {
                require("client_id", client_id)?;
                require("client_secret", client_secret)?;
                require("tenant_id", tenant_id)
            },
            DataSourceCredential::ServicePrincipalInKeyVault {
                key_vault_endpoint,
                key_vault_client_id,
                key_vault_client_secret,
                secret_name_for_client_id,
                secret_name_for_client_secret,
                tenant_id,
                ..
            } => {
                require("key_vault_endpoint", key_vault_endpoint)?;
                require("key_vault_client_id", key_vault_client_id)?;
                require("key_vault_client_secret", key_vault_client_secret)?;
                require("secret_name_for_client_id", secret_name_for_client_id)?;
                require("secret_name_for_client_secret", secret_name_for_client_secret)?;
                require("tenant_id", tenant_id)
            },
        }
    }
}

impl fmt::Debug for DataSourceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("DataSourceCredential");
        s.field("kind", &self.kind())
            .field("id", &self.id())
            .field("name", &self.name());
        match self {
            DataSourceCredential::SqlConnectionString {
                connection_string, ..
            } => s.field("connection_string", &redact(connection_string)),
            DataSourceCredential::DataLakeGen2SharedKey { account_key, .. } => {
                s.field("account_key", &redact(account_key))
            },
            DataSourceCredential::ServicePrincipal {
                client_id,
                client_secret,
                tenant_id,
                ..
            } => s
                .field("client_id", client_id)
                .field("client_secret", &redact(client_secret))
                .field("tenant_id", tenant_id),
            DataSourceCredential::ServicePrincipalInKeyVault {
                key_vault_endpoint,
                key_vault_client_secret,
                tenant_id,
                ..
            } => s
                .field("key_vault_endpoint", key_vault_endpoint)
                .field("key_vault_client_secret", &redact(key_vault_client_secret))
                .field("tenant_id", tenant_id),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secrets() {
        let credential = DataSourceCredential::service_principal("sp", "client", "s3cret", "tenant");
        let debug = format!("{:?}", credential);
        assert!(debug.contains("client"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_redacted_blanks_secret() {
        let credential = DataSourceCredential::sql_connection_string("sql", "Server=.;Password=x");
        match credential.redacted() {
            DataSourceCredential::SqlConnectionString {
                connection_string, ..
            } => assert!(connection_string.is_empty()),
            other => panic!("Unexpected variant {:?}", other),
        }
    }

    #[test]
    fn test_blank_secret_kept_from_stored() {
        let stored = DataSourceCredential::service_principal("sp", "client", "s3cret", "tenant");
        let mut incoming = stored.redacted();
        incoming.keep_secrets_from(&stored);
        assert_eq!(incoming, stored);

        let mut rotated = DataSourceCredential::service_principal("sp", "client", "fresh", "tenant");
        rotated.keep_secrets_from(&stored);
        match rotated {
            DataSourceCredential::ServicePrincipal { client_secret, .. } => assert_eq!(client_secret, "fresh"),
            other => panic!("Unexpected variant {:?}", other),
        }
    }

    #[test]
    fn test_validation() {
        assert!(DataSourceCredential::sql_connection_string("sql", "Server=.").validate().is_ok());
        assert!(DataSourceCredential::sql_connection_string("sql", "").validate().is_err());
        assert!(DataSourceCredential::service_principal("sp", "c", "", "t").validate().is_err());
    }
}
