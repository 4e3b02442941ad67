//! Access to the host's block settings.
//!
//! The embedding host keeps a single settings map (`XBLOCK_SETTINGS`) with one entry per block
//! type. The launcher only ever looks at the [`BLOCK_SETTINGS_KEY`] namespace:
//!
//! ```json
//! {
//!     "skytap": {
//!         "boomi_configuration": {
//!             "base_url": "https://connect.boomi.example.com",
//!             "endpoint": "/ws/simple/createVm",
//!             "username": "foo",
//!             "token": "${boomi_token}"
//!         },
//!         "keyboard_layouts": { "de": "German", "us": "English (US)" }
//!     }
//! }
//! ```
//!
//! Settings files support `${parameter_name}` template parameters which are substituted at load
//! time, so that secrets can be passed in from the environment instead of living in the file.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, error};

/// Namespace of the launcher inside the host settings map
pub const BLOCK_SETTINGS_KEY: &str = "skytap";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings file not found: '{file_path}'")]
    NotFound {
        #[source]
        source: std::io::Error,
        file_path: String,
    },

    #[error("Unsupported settings format: '{0}'")]
    UnknownFormat(SettingsFormat),

    #[error("Missing template parameters: {0:?}")]
    MissingParams(HashSet<String>),

    #[error("JSON parsing error in settings")]
    ParseJson(#[source] serde_json::Error),

    #[cfg(feature = "yaml")]
    #[error("YAML parsing error in settings")]
    ParseYaml(#[source] serde_yml::Error),

    #[cfg(feature = "toml")]
    #[error("TOML parsing error in settings")]
    ParseToml(#[source] toml::de::Error),
}

/// Serialization format of a settings file, inferred from its extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsFormat {
    /// JSON format (.json files)
    Json,
    /// TOML format (.toml files)
    Toml,
    /// YAML format (.yml or .yaml files)
    Yaml,
    /// Unknown or unsupported format
    Unknown(String),
}

impl SettingsFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_lowercase();

        match ext.as_str() {
            "json" => SettingsFormat::Json,
            "toml" => SettingsFormat::Toml,
            "yml" | "yaml" => SettingsFormat::Yaml,
            _ => SettingsFormat::Unknown(ext),
        }
    }
}

impl std::fmt::Display for SettingsFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsFormat::Json => write!(f, "json"),
            SettingsFormat::Toml => write!(f, "toml"),
            SettingsFormat::Yaml => write!(f, "yaml"),
            SettingsFormat::Unknown(format) => write!(f, "{format}"),
        }
    }
}

/// Settings service provided by the host.
///
/// Returns `None` when the host has no settings service or holds no entry for the
/// launcher, never an error.
pub trait SettingsStore: Send + Sync {
    fn block_settings(&self) -> Option<Value>;
}

/// Settings held in memory, mostly useful for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    settings: Option<Value>,
}

impl StaticSettings {
    /// Wrap a full host settings map
    pub fn new(settings: Value) -> Self {
        Self {
            settings: Some(settings),
        }
    }

    /// A host without a settings service
    pub fn unavailable() -> Self {
        Self { settings: None }
    }
}

impl SettingsStore for StaticSettings {
    fn block_settings(&self) -> Option<Value> {
        self.settings.as_ref()?.get(BLOCK_SETTINGS_KEY).cloned()
    }
}

/// Settings read from a file on every access, so edits take effect without a restart
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
    format: SettingsFormat,
    params: HashMap<String, String>,
}

impl FileSettings {
    pub fn new<P: Into<PathBuf>>(path: P, params: HashMap<String, String>) -> Self {
        let path = path.into();
        let format = SettingsFormat::from_path(&path);
        Self {
            path,
            format,
            params,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, substitute and parse the full host settings map
    pub fn load(&self) -> Result<Value, SettingsError> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| SettingsError::NotFound {
                source: e,
                file_path: self.path.display().to_string(),
            })?;

        parse_settings(&contents, &self.format, &self.params)
    }
}

impl SettingsStore for FileSettings {
    fn block_settings(&self) -> Option<Value> {
        match self.load() {
            Ok(settings) => settings.get(BLOCK_SETTINGS_KEY).cloned(),
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = ?e,
                    "Failed to load settings, treating them as unavailable"
                );
                None
            }
        }
    }
}

/// Parse a settings document of the given format after substituting template parameters
pub fn parse_settings(
    contents: &str,
    format: &SettingsFormat,
    params: &HashMap<String, String>,
) -> Result<Value, SettingsError> {
    debug!("Parsing settings with format: {format}");

    let definition = substitute_params(contents, params)?;

    match format {
        SettingsFormat::Json => serde_json::from_str(&definition).map_err(SettingsError::ParseJson),
        SettingsFormat::Yaml => {
            #[cfg(feature = "yaml")]
            {
                serde_yml::from_str(&definition).map_err(SettingsError::ParseYaml)
            }
            #[cfg(not(feature = "yaml"))]
            {
                Err(SettingsError::UnknownFormat(SettingsFormat::Yaml))
            }
        }
        SettingsFormat::Toml => {
            #[cfg(feature = "toml")]
            {
                toml::from_str(&definition).map_err(SettingsError::ParseToml)
            }
            #[cfg(not(feature = "toml"))]
            {
                Err(SettingsError::UnknownFormat(SettingsFormat::Toml))
            }
        }
        SettingsFormat::Unknown(_) => Err(SettingsError::UnknownFormat(format.clone())),
    }
}

/// Replace every `${name}` with its value from `params`.
///
/// Fails with every parameter left unresolved, not just the first.
pub fn substitute_params(
    raw: &str,
    params: &HashMap<String, String>,
) -> Result<String, SettingsError> {
    static PARAM_REGEX: OnceLock<Regex> = OnceLock::new();
    let mut definition = raw.to_string();

    params.iter().for_each(|(name, value)| {
        let template = format!("${{{name}}}");
        definition = definition.replace(template.as_str(), value.as_str());
    });

    let regex = PARAM_REGEX.get_or_init(|| {
        Regex::new("\\$\\{([a-zA-Z0-9_]+)\\}").expect("invalid regex")
    });

    let missing_params = regex
        .captures_iter(definition.as_str())
        .filter_map(|capture| capture.get(1))
        .map(|name| name.as_str().to_string())
        .collect::<HashSet<String>>();

    if !missing_params.is_empty() {
        return Err(SettingsError::MissingParams(missing_params));
    }

    Ok(definition)
}
