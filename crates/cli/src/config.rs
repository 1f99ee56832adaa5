//! Layered CLI settings
//!
//! Built-in defaults, then `cardcrypt.toml` (or the file given with
//! `--config`), then `CARDCRYPT_*` environment variables.

use std::path::{Path, PathBuf};

use cardcrypt_applet::constants::cla;
use cardcrypt_applet::{AppletConfig, Condition};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Default settings file, looked up in the working directory
pub const CONFIG_FILE: &str = "cardcrypt.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "CARDCRYPT_";

/// Execute condition installed on the private key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutePolicy {
    /// DECRYPT always allowed
    #[default]
    Always,
    /// DECRYPT always refused
    Never,
    /// No execute rule on the key
    Unset,
}

impl From<ExecutePolicy> for Option<Condition> {
    fn from(policy: ExecutePolicy) -> Self {
        match policy {
            ExecutePolicy::Always => Some(Condition::Always),
            ExecutePolicy::Never => Some(Condition::Never),
            ExecutePolicy::Unset => None,
        }
    }
}

/// Settings for installing the applet on the virtual card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// PKCS#8 PEM private key provisioned into the applet
    pub key: PathBuf,
    /// Class byte DECRYPT is accepted on
    pub cla: u8,
    /// Execute policy on the private key
    pub execute: ExecutePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key: PathBuf::from("cardcrypt-key.pem"),
            cla: cla::APPLET,
            execute: ExecutePolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, the settings file and the environment
    ///
    /// A missing settings file is not an error.
    pub fn load(file: Option<&Path>) -> eyre::Result<Self> {
        let file = file.unwrap_or_else(|| Path::new(CONFIG_FILE));
        Ok(Self::figment(file).extract()?)
    }

    fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Applet configuration these settings describe
    pub fn applet_config(&self) -> AppletConfig {
        AppletConfig {
            cla: self.cla,
            execute: self.execute.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let settings = Settings::load(None).map_err(|e| e.to_string())?;
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.applet_config(), AppletConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                key = "keys/card.pem"
                cla = 0x90
                execute = "never"
                "#,
            )?;
            let settings = Settings::load(None).map_err(|e| e.to_string())?;
            assert_eq!(settings.key, PathBuf::from("keys/card.pem"));
            assert_eq!(settings.cla, 0x90);
            assert_eq!(settings.applet_config().execute, Some(Condition::Never));

            jail.set_env("CARDCRYPT_EXECUTE", "unset");
            jail.set_env("CARDCRYPT_KEY", "other.pem");
            let settings = Settings::load(None).map_err(|e| e.to_string())?;
            assert_eq!(settings.key, PathBuf::from("other.pem"));
            assert_eq!(settings.applet_config().execute, None);
            assert_eq!(settings.cla, 0x90);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file() {
        Jail::expect_with(|jail| {
            jail.create_file("alt.toml", "cla = 128")?;
            let settings = Settings::load(Some(Path::new("alt.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(settings.cla, cla::APPLET);
            Ok(())
        });
    }
}
