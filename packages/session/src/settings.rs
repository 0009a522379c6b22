use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::Deserialize;

use crate::auth::ProviderKind;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthSettings {
    /// Organization email domain, without the `@`.
    pub allowed_domain: String,
    pub provider: ProviderKind,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            allowed_domain: "sst.scaler.com".into(),
            provider: ProviderKind::Google,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreSettings {
    /// Collection holding one profile per identity.
    pub profile_collection: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            profile_collection: "users".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Settings {
    pub auth: AuthSettings,
    pub store: StoreSettings,
}

impl Settings {
    /// Defaults, then `config.toml` if present, then the environment
    /// (`AUTH__ALLOWED_DOMAIN`, `STORE__PROFILE_COLLECTION`, ...).
    pub fn load() -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(
                File::with_name("config.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Defaults overlaid with a TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = Settings::default();
        Config::builder()
            .set_default("auth.allowed_domain", defaults.auth.allowed_domain)?
            .set_default("auth.provider", "google")?
            .set_default("store.profile_collection", defaults.store.profile_collection)
    }
}
