use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use setup_sync::{CatalogError, ModelCatalog, ModelRegistry, Priority, SessionError, SessionHandle};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

/// Who to set up, and where.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_account")]
    pub account: String,
    #[serde(default = "default_database")]
    pub database: String,
    pub server_url: Option<String>,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            account: default_account(),
            database: default_database(),
            server_url: None,
            token_env: default_token_env(),
        }
    }
}

impl SessionConfig {
    /// Build the session, with an optional account override from the command line.
    pub fn session(&self, account: Option<&str>) -> Result<SessionHandle, SessionError> {
        let mut session =
            SessionHandle::new(account.unwrap_or(&self.account), self.database.clone())?;
        if let Some(url) = &self.server_url {
            session = session.with_server_url(url.clone());
        }
        if let Ok(token) = std::env::var(&self.token_env) {
            session = session.with_token(token);
        }
        Ok(session)
    }
}

/// Where records come from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum RemoteConfig {
    /// Directory of `<model>.json` snapshot files.
    #[serde(rename = "snapshot")]
    Snapshot { path: PathBuf },

    /// HTTP snapshot endpoint; defaults to the session's server URL.
    #[serde(rename = "http")]
    Http { url: Option<String> },
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::Snapshot {
            path: data_dir().join("snapshots"),
        }
    }
}

/// Models per tier, in execution order within each tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub high: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub low: Vec<String>,
    #[serde(default)]
    pub default: Vec<String>,
    /// Only built-in models can be constructed; others are skipped.
    #[serde(default)]
    pub strict: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let names = |models: &[&str]| -> Vec<String> {
            models.iter().map(|m| (*m).to_owned()).collect()
        };
        Self {
            high: names(BUILTIN_HIGH),
            medium: names(BUILTIN_MEDIUM),
            low: names(BUILTIN_LOW),
            default: names(BUILTIN_DEFAULT),
            strict: false,
        }
    }
}

const BUILTIN_HIGH: &[&str] = &["ir.module.module", "res.company", "res.users"];
const BUILTIN_MEDIUM: &[&str] = &["res.groups", "ir.model.access", "ir.rule"];
const BUILTIN_LOW: &[&str] = &["ir.model.data"];
const BUILTIN_DEFAULT: &[&str] = &["res.partner", "res.country", "res.currency"];

impl CatalogConfig {
    pub fn names_for(&self, priority: Priority) -> &[String] {
        match priority {
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
            Priority::Default => &self.default,
        }
    }

    /// Registration table holding every built-in model.
    pub fn registry(&self) -> ModelRegistry {
        let mut registry = if self.strict {
            ModelRegistry::new()
        } else {
            ModelRegistry::permissive()
        };

        for name in BUILTIN_HIGH
            .iter()
            .chain(BUILTIN_MEDIUM)
            .chain(BUILTIN_LOW)
            .chain(BUILTIN_DEFAULT)
        {
            registry.register_standard(*name);
        }
        registry
    }

    pub fn build(&self) -> Result<ModelCatalog, CatalogError> {
        let entries = Priority::ALL.into_iter().flat_map(|priority| {
            self.names_for(priority)
                .iter()
                .map(move |name| (priority, name.as_str()))
        });
        ModelCatalog::from_names(entries, &self.registry())
    }
}

/// Dependency gate settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GateConfig {
    #[serde(default = "default_registry_model")]
    pub registry_model: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            registry_model: default_registry_model(),
        }
    }
}

fn default_account() -> String {
    "admin".into()
}

fn default_database() -> String {
    "default".into()
}

fn default_token_env() -> String {
    "SETUP_SYNC_TOKEN".into()
}

fn default_registry_model() -> String {
    "ir.module.module".into()
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("setup-sync")
}

/// Config file path: `~/.config/setup-sync/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("setup-sync").join("config.toml"))
}

/// Load config from file, falling back to defaults if missing.
pub fn load_config() -> AppConfig {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => return config,
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config, using defaults"
            ),
        }
    }

    AppConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_tier() {
        let config = AppConfig::default();
        for priority in Priority::ALL {
            assert!(!config.catalog.names_for(priority).is_empty());
        }
        assert_eq!(config.catalog.high[0], "ir.module.module");
        assert_eq!(config.gate.registry_model, "ir.module.module");
        assert!(matches!(config.remote, RemoteConfig::Snapshot { .. }));
    }

    #[test]
    fn default_catalog_builds() {
        let catalog = CatalogConfig::default().build().unwrap();
        assert_eq!(catalog.len(), 10);
        assert_eq!(
            catalog.descriptors_for(Priority::Low)[0].name(),
            "ir.model.data"
        );
    }

    #[test]
    fn parse_full_config_from_toml() {
        let toml_str = r#"
[session]
account = "demo"
database = "erp"
server_url = "https://erp.example.com"

[remote]
type = "http"

[catalog]
high = ["ir.module.module"]
default = ["res.partner", "product.product"]

[gate]
registry_model = "x.modules"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.session.account, "demo");
        assert_eq!(config.session.token_env, "SETUP_SYNC_TOKEN");
        assert!(matches!(config.remote, RemoteConfig::Http { url: None }));
        assert!(config.catalog.medium.is_empty());
        assert_eq!(config.catalog.default.len(), 2);
        assert_eq!(config.gate.registry_model, "x.modules");
    }

    #[test]
    fn parse_snapshot_remote_from_toml() {
        let toml_str = r#"
[remote]
type = "snapshot"
path = "/srv/snapshots"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        match config.remote {
            RemoteConfig::Snapshot { path } => assert_eq!(path, PathBuf::from("/srv/snapshots")),
            _ => panic!("expected Snapshot"),
        }
    }

    #[test]
    fn duplicate_model_is_rejected() {
        let toml_str = r#"
[catalog]
high = ["res.users"]
medium = ["res.users"]
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(config.catalog.build().is_err());
    }

    #[test]
    fn strict_catalog_only_binds_builtins() {
        let toml_str = r#"
[catalog]
strict = true
default = ["res.partner", "x.custom"]
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        let catalog = config.catalog.build().unwrap();
        let session = SessionHandle::new("admin", "prod").unwrap();

        let tier = catalog.descriptors_for(Priority::Default);
        assert!(tier[0].construct(&session).is_ok());
        assert!(tier[1].construct(&session).is_err());
    }

    #[test]
    fn account_override_wins() {
        let session = SessionConfig::default().session(Some("demo")).unwrap();
        assert_eq!(session.account(), "demo");
        assert_eq!(session.database(), "default");
    }

    #[test]
    fn empty_account_is_a_session_error() {
        let config = SessionConfig {
            account: String::new(),
            ..SessionConfig::default()
        };
        assert!(config.session(None).is_err());
    }
}
