//! Boomi broker connection settings.

use base64::Engine;
use serde_json::Value;
use url::Url;

use crate::settings::SettingsStore;

/// Key of the broker connection entry inside the block settings
pub const BOOMI_CONFIGURATION_KEY: &str = "boomi_configuration";

/// Entries the broker connection entry must provide, in the order they are reported
pub const REQUIRED_ENTRIES: [&str; 4] = ["base_url", "endpoint", "username", "token"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Skytap settings do not contain a 'boomi_configuration' entry")]
    Missing,

    #[error(
        "'boomi_configuration' is missing required entries: {}",
        .missing.join(", ")
    )]
    Invalid { missing: Vec<&'static str> },

    #[error("'boomi_configuration' does not form a valid URL from base_url '{base_url}' and endpoint '{endpoint}'")]
    InvalidUrl {
        base_url: String,
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

/// Connection settings of the Boomi broker
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerConfiguration {
    pub base_url: String,
    pub endpoint: String,
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for BrokerConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfiguration")
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl BrokerConfiguration {
    /// Authenticated URL of the broker endpoint.
    ///
    /// `endpoint` is resolved against `base_url` with standard URL-join semantics and the
    /// credentials are appended as `;boomi_auth=<base64(username:token)>`.
    pub fn boomi_url(&self) -> Result<String, ConfigurationError> {
        let invalid_url = |source| ConfigurationError::InvalidUrl {
            base_url: self.base_url.clone(),
            endpoint: self.endpoint.clone(),
            source,
        };

        let endpoint_url = Url::parse(&self.base_url)
            .and_then(|base| base.join(&self.endpoint))
            .map_err(invalid_url)?;

        let credentials = format!("{}:{}", self.username, self.token);
        let boomi_auth = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());

        Ok(format!("{endpoint_url};boomi_auth={boomi_auth}"))
    }
}

/// Read the broker connection settings from the block settings.
///
/// Absence of the whole entry and absence of individual entries are reported as distinct
/// errors. Entries that are empty or not strings count as missing.
pub fn resolve_broker_configuration(
    settings: &dyn SettingsStore,
) -> Result<BrokerConfiguration, ConfigurationError> {
    let block_settings = settings.block_settings().ok_or(ConfigurationError::Missing)?;
    let entry = block_settings
        .get(BOOMI_CONFIGURATION_KEY)
        .ok_or(ConfigurationError::Missing)?;

    let lookup = |name: &str| {
        entry
            .get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let missing = REQUIRED_ENTRIES
        .into_iter()
        .filter(|name| lookup(*name).is_none())
        .collect::<Vec<_>>();

    match (
        lookup("base_url"),
        lookup("endpoint"),
        lookup("username"),
        lookup("token"),
    ) {
        (Some(base_url), Some(endpoint), Some(username), Some(token)) => Ok(BrokerConfiguration {
            base_url,
            endpoint,
            username,
            token,
        }),
        _ => Err(ConfigurationError::Invalid { missing }),
    }
}

/// Authenticated broker URL straight from the block settings
pub fn get_boomi_url(settings: &dyn SettingsStore) -> Result<String, ConfigurationError> {
    resolve_broker_configuration(settings)?.boomi_url()
}
