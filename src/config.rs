//! Server configuration.

use crate::error::{Error, Result};
use crate::replica::{FileReplica, HttpReplica, MemoryReplica, Replica};
use crate::serializer::JsonSerializer;
use crate::store::ReplicatedStore;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    3000,
);

/// Server configuration
///
/// Usually loaded from a TOML file with [`Self::load`] or from the
/// environment with [`Self::from_env`]. [`Default`] gives two in-memory
/// replicas, suitable for local development and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config for the HTTP server
    #[serde(default)]
    pub http: HttpConfig,
    /// Where reads go first.
    #[serde(default)]
    pub primary: ReplicaConfig,
    /// Fallback and second write target.
    #[serde(default)]
    pub backup: ReplicaConfig,
    /// Write indented JSON to replicas.
    #[serde(default)]
    pub pretty: bool,
    /// Per-request timeout for HTTP replicas, in seconds. Unset means the
    /// client's defaults.
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

/// Config for the HTTP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Address to listen on.
    pub bind_addr: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
        }
    }
}

/// Where one replica lives.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReplicaConfig {
    /// Remote GET/PUT blob endpoint.
    Http {
        /// Full blob url.
        url: String,
    },
    /// JSON file on local disk.
    File {
        /// Path to the file.
        path: PathBuf,
    },
    /// Process memory; lost on restart.
    #[default]
    Memory,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            primary: ReplicaConfig::Memory,
            backup: ReplicaConfig::Memory,
            pretty: false,
            request_timeout: None,
        }
    }
}

impl Config {
    /// Load the config from a TOML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let s = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::parse(&s)
    }

    /// Parse a config from TOML text.
    pub fn parse(s: &str) -> Result<Config> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Build a config from `QBOARD_BIND`, `QBOARD_PRIMARY_URL`,
    /// `QBOARD_BACKUP_URL` and `QBOARD_TIMEOUT_SECS`. A missing url falls back
    /// to an in-memory replica.
    pub fn from_env() -> Result<Config> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] but reading variables through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let mut config = Config::default();

        if let Some(bind) = var("QBOARD_BIND") {
            config.http.bind_addr = bind
                .parse()
                .map_err(|e| Error::Config(format!("invalid QBOARD_BIND {bind:?}: {e}")))?;
        } else {
            info!("QBOARD_BIND not set, using default: {DEFAULT_BIND_ADDR}");
        }

        for (key, slot) in [
            ("QBOARD_PRIMARY_URL", &mut config.primary),
            ("QBOARD_BACKUP_URL", &mut config.backup),
        ] {
            match var(key) {
                Some(url) => *slot = ReplicaConfig::Http { url },
                None => warn!("{key} not set, using an in-memory replica"),
            }
        }

        if let Some(secs) = var("QBOARD_TIMEOUT_SECS") {
            let secs = secs
                .parse()
                .map_err(|e| Error::Config(format!("invalid QBOARD_TIMEOUT_SECS {secs:?}: {e}")))?;
            config.request_timeout = Some(secs);
        }

        Ok(config)
    }

    /// Serializer used for replica bodies.
    pub fn serializer(&self) -> JsonSerializer {
        if self.pretty {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        }
    }

    /// Construct the replicated store this config describes.
    pub fn build_store(&self) -> Result<ReplicatedStore> {
        let mut client = reqwest::Client::builder();
        if let Some(secs) = self.request_timeout {
            client = client.timeout(Duration::from_secs(secs));
        }
        let client = client.build()?;

        let primary = self.primary.build("primary", &client, self.serializer())?;
        let backup = self.backup.build("backup", &client, self.serializer())?;
        Ok(ReplicatedStore::new(primary, backup))
    }
}

impl ReplicaConfig {
    fn build(
        &self,
        name: &str,
        client: &reqwest::Client,
        serializer: JsonSerializer,
    ) -> Result<Arc<dyn Replica>> {
        let replica: Arc<dyn Replica> = match self {
            ReplicaConfig::Http { url } => {
                Arc::new(HttpReplica::with_client(name, url, client.clone())?.serializer(serializer))
            }
            ReplicaConfig::File { path } => {
                Arc::new(FileReplica::new(name, path).serializer(serializer))
            }
            ReplicaConfig::Memory => Arc::new(MemoryReplica::new(name)),
        };
        Ok(replica)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parse_toml() {
        let config = Config::parse(
            r#"
            pretty = true
            request_timeout = 5

            [http]
            bind_addr = "127.0.0.1:8080"

            [primary]
            kind = "http"
            url = "https://blobs.example.com/api/board"

            [backup]
            kind = "file"
            path = "/var/lib/qboard/backup.json"
            "#,
        )
        .unwrap();
        assert!(config.pretty);
        assert_eq!(config.request_timeout, Some(5));
        assert_eq!(config.http.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(
            config.primary,
            ReplicaConfig::Http {
                url: "https://blobs.example.com/api/board".into()
            }
        );
        assert_eq!(
            config.backup,
            ReplicaConfig::File {
                path: "/var/lib/qboard/backup.json".into()
            }
        );
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_replica_kind_is_config_error() {
        let err = Config::parse("[primary]\nkind = \"s3\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn vars_override_defaults() {
        let vars: HashMap<&str, &str> = [
            ("QBOARD_BIND", "127.0.0.1:9000"),
            ("QBOARD_PRIMARY_URL", "http://a.example/blob"),
            ("QBOARD_TIMEOUT_SECS", "3"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.http.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(
            config.primary,
            ReplicaConfig::Http {
                url: "http://a.example/blob".into()
            }
        );
        assert_eq!(config.backup, ReplicaConfig::Memory);
        assert_eq!(config.request_timeout, Some(3));
    }

    #[test]
    fn bad_bind_addr_is_config_error() {
        let err = Config::from_vars(|k| (k == "QBOARD_BIND").then(|| "nope".to_string()));
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn build_store_rejects_bad_url() {
        let config = Config {
            primary: ReplicaConfig::Http { url: "::".into() },
            ..Config::default()
        };
        assert!(matches!(config.build_store(), Err(Error::Config(_))));
    }
}
