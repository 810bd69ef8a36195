//! Endpoint configuration.
//!
//! Settings are layered: built-in defaults, then the TOML config file, then
//! the environment. Everything is resolved once at startup into an
//! [`EndpointConfig`] which is handed to the provider.

use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::fmt;
use std::path::PathBuf;
use url::Url;

use crate::warn;

pub(crate) const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const API_BASE_VAR: &str = "OPENAI_BASE_URL";
const MODEL_VAR: &str = "OPENAI_MODEL";

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error("failed to read config \"{}\": {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(
        #[from]
        #[source]
        toml::de::Error,
    ),

    #[error("failed to parse {var}, it is not valid unicode")]
    NotUnicode { var: &'static str },

    /// There is no default API key
    #[error("no API key was found, set OPENAI_API_KEY or endpoint.api_key in the config file")]
    MissingApiKey,

    #[error("invalid API base \"{value}\": {source}")]
    InvalidApiBase {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("the default model is blank")]
    BlankModel,
}

#[derive(Deserialize, Serialize, Default, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Keybindings {
    #[default]
    Emacs,
    Vi,
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub(crate) struct Endpoint {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub default_model: Option<String>,
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub(crate) struct Config {
    #[serde(default)]
    pub keybindings: Keybindings,
    #[serde(default)]
    pub endpoint: Endpoint,
}

fn get_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME");

    if let Some(home) = home {
        let home = PathBuf::from(home);

        const USER_PATHS: [&str; 2] = [".config/xtalk/config.toml", ".xtalk.toml"];

        for &path in USER_PATHS.iter() {
            let fullpath = home.join(path);

            if fullpath.exists() {
                return Some(fullpath);
            }
        }
    }

    let system_config = PathBuf::from("/etc/xtalk.toml");

    if system_config.exists() {
        Some(system_config)
    } else {
        None
    }
}

fn extraneous_keys_helper<'a>(
    path: &mut Vec<&'a str>,
    user_config: &'a toml::Table,
    config: &'a toml::Table,
    found: &mut Vec<String>,
) {
    for (user_key, user_value) in user_config {
        path.push(user_key);

        match (user_value, config.get(user_key)) {
            (toml::Value::Table(user_value), Some(toml::Value::Table(config_value))) => {
                extraneous_keys_helper(path, user_value, config_value, found)
            }
            (_, Some(_)) => {}
            (_, None) => found.push(path.join(".")),
        }

        path.pop();
    }
}

/// Lists the dotted paths of keys in `raw_config` which `config` does not
/// retain, i.e. keys that were silently ignored while deserializing.
fn extraneous_keys(config: &Config, raw_config: &str) -> Vec<String> {
    let Ok(user_config) = toml::from_str::<toml::Table>(raw_config) else {
        return Vec::new();
    };

    let Some(config) = toml::to_string(config)
        .ok()
        .and_then(|serialized| toml::from_str::<toml::Table>(&serialized).ok())
    else {
        return Vec::new();
    };

    let mut path = Vec::new();
    let mut found = Vec::new();

    extraneous_keys_helper(&mut path, &user_config, &config, &mut found);

    found
}

pub(crate) fn parse_config(raw_config: &str) -> Result<Config, Error> {
    let config: Config = toml::from_str(raw_config)?;

    for key in extraneous_keys(&config, raw_config) {
        warn!("config contains extraneous key \"{}\", ignoring", key);
    }

    Ok(config)
}

/// Reads the config at `config`, or the first config found in the default
/// locations. Without any config file, the defaults are used.
pub(crate) fn read_config(config: Option<PathBuf>) -> Result<Config, Error> {
    let config_path = config.or_else(get_config_path);

    if let Some(path) = config_path {
        let raw_config = match std::fs::read_to_string(&path) {
            Ok(raw_config) => raw_config,
            Err(source) => return Err(Error::Read { path, source }),
        };

        tracing::debug!(path = %path.display(), "loaded config");

        parse_config(&raw_config)
    } else {
        Ok(Config::default())
    }
}

/// Looks up a variable in the process environment. Blank values count as unset.
pub(crate) fn process_env(var: &'static str) -> Result<Option<String>, Error> {
    match std::env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(Error::NotUnicode { var }),
    }
}

/// The merged settings, before the API key is required
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    api_key: Option<String>,
    api_base: String,
    pub default_model: String,
}

impl Settings {
    /// Layers `env` over `config` over the built-in defaults
    pub(crate) fn merge<F>(config: &Config, env: F) -> Result<Settings, Error>
    where
        F: Fn(&'static str) -> Result<Option<String>, Error>,
    {
        let from_file = |value: &Option<String>| {
            value
                .as_ref()
                .filter(|value| !value.trim().is_empty())
                .cloned()
        };

        let api_key = env(API_KEY_VAR)?.or_else(|| from_file(&config.endpoint.api_key));

        let api_base = env(API_BASE_VAR)?
            .or_else(|| from_file(&config.endpoint.api_base))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let default_model = match env(MODEL_VAR)? {
            Some(model) => model,
            None => match &config.endpoint.default_model {
                Some(model) if model.trim().is_empty() => return Err(Error::BlankModel),
                Some(model) => model.clone(),
                None => DEFAULT_MODEL.to_string(),
            },
        };

        Ok(Settings {
            api_key,
            api_base,
            default_model: default_model.trim().to_string(),
        })
    }

    /// Produces the endpoint configuration, failing if no API key is set
    pub(crate) fn endpoint(self) -> Result<EndpointConfig, Error> {
        let api_key = self.api_key.ok_or(Error::MissingApiKey)?;

        let api_base = match Url::parse(&self.api_base) {
            Ok(api_base) => api_base,
            Err(source) => {
                return Err(Error::InvalidApiBase {
                    value: self.api_base,
                    source,
                })
            }
        };

        Ok(EndpointConfig {
            api_key,
            api_base,
            default_model: self.default_model,
        })
    }
}

/// Everything needed to reach the completion endpoint
#[derive(Clone)]
pub(crate) struct EndpointConfig {
    pub api_key: String,
    pub api_base: Url,
    pub default_model: String,
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base.as_str())
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_with(
        vars: &[(&'static str, &str)],
    ) -> impl Fn(&'static str) -> Result<Option<String>, Error> {
        let vars: HashMap<&'static str, String> = vars
            .iter()
            .map(|(var, value)| (*var, value.to_string()))
            .collect();

        move |var| Ok(vars.get(var).cloned())
    }

    #[test]
    fn test_defaults_without_key() {
        let settings = Settings::merge(&Config::default(), env_with(&[])).unwrap();

        assert_eq!(settings.default_model, DEFAULT_MODEL);
        assert!(matches!(settings.endpoint(), Err(Error::MissingApiKey)));
    }

    #[test]
    fn test_defaults_with_key() {
        let settings =
            Settings::merge(&Config::default(), env_with(&[(API_KEY_VAR, "sk-env")])).unwrap();

        let endpoint = settings.endpoint().unwrap();

        assert_eq!(endpoint.api_key, "sk-env");
        assert_eq!(endpoint.api_base.as_str(), DEFAULT_API_BASE);
        assert_eq!(endpoint.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_file_settings() {
        let config = parse_config(
            r#"
            keybindings = "vi"

            [endpoint]
            api_key = "sk-file"
            api_base = "https://proxy.example/openai/v1"
            default_model = "gpt-4o"
            "#,
        )
        .unwrap();

        assert_eq!(config.keybindings, Keybindings::Vi);

        let endpoint = Settings::merge(&config, env_with(&[]))
            .unwrap()
            .endpoint()
            .unwrap();

        assert_eq!(endpoint.api_key, "sk-file");
        assert_eq!(endpoint.api_base.as_str(), "https://proxy.example/openai/v1");
        assert_eq!(endpoint.default_model, "gpt-4o");
    }

    #[test]
    fn test_environment_overrides_file() {
        let config = parse_config(
            r#"
            [endpoint]
            api_key = "sk-file"
            default_model = "gpt-4o"
            "#,
        )
        .unwrap();

        let env = env_with(&[
            (API_KEY_VAR, "sk-env"),
            (API_BASE_VAR, "http://localhost:8080/v1"),
            (MODEL_VAR, "gpt-4-turbo"),
        ]);

        let endpoint = Settings::merge(&config, env).unwrap().endpoint().unwrap();

        assert_eq!(endpoint.api_key, "sk-env");
        assert_eq!(endpoint.api_base.as_str(), "http://localhost:8080/v1");
        assert_eq!(endpoint.default_model, "gpt-4-turbo");
    }

    #[test]
    fn test_invalid_api_base() {
        let env = env_with(&[(API_KEY_VAR, "sk-env"), (API_BASE_VAR, "not a url")]);

        let err = Settings::merge(&Config::default(), env)
            .unwrap()
            .endpoint()
            .unwrap_err();

        assert!(matches!(err, Error::InvalidApiBase { .. }));
    }

    #[test]
    fn test_blank_model_in_file() {
        let config = parse_config("[endpoint]\ndefault_model = \" \"\n").unwrap();

        assert!(matches!(
            Settings::merge(&config, env_with(&[])),
            Err(Error::BlankModel)
        ));
    }

    #[test]
    fn test_extraneous_keys() {
        let raw = r#"
            editor = "vim"

            [endpoint]
            api_key = "sk-file"
            organization = "acme"
            "#;

        let config: Config = toml::from_str(raw).unwrap();

        let mut keys = extraneous_keys(&config, raw);
        keys.sort();

        assert_eq!(keys, vec!["editor", "endpoint.organization"]);
    }

    #[test]
    fn test_malformed_config() {
        assert!(matches!(
            parse_config("keybindings = \"helix\""),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let endpoint = Settings::merge(&Config::default(), env_with(&[(API_KEY_VAR, "sk-secret")]))
            .unwrap()
            .endpoint()
            .unwrap();

        let debug = format!("{:?}", endpoint);

        assert!(!debug.contains("sk-secret"));
    }
}
