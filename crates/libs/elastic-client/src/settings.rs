use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use elasticsearch::auth::Credentials;
use serde::{Deserialize, Serialize};
use store_config::{config_dir, StoreConfig};
use url::Url;

use serde_helpers::{
    default_false, default_true, deserialize_duration, serialize_duration, serialize_redacted,
};

use crate::errors::{ElasticClientError, Result};

/// How the client authenticates against the cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationType {
    #[default]
    #[serde(alias = "NONE")]
    None,
    /// `username` and `password`.
    #[serde(alias = "BASIC")]
    Basic,
    /// Bearer `authorization_token`.
    #[serde(alias = "TOKEN")]
    Token,
    /// `api_key_id` and `api_key_secret`.
    #[serde(alias = "APIKEY", alias = "api_key")]
    ApiKey,
}

impl fmt::Display for AuthenticationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthenticationType::None => "none",
            AuthenticationType::Basic => "basic",
            AuthenticationType::Token => "token",
            AuthenticationType::ApiKey => "apikey",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => f.write_str("http"),
            Scheme::Https => f.write_str("https"),
        }
    }
}

/// Connection parameters of the Elasticsearch cluster.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ElasticsearchParameters {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub scheme: Scheme,
    #[serde(default)]
    pub authentication_type: AuthenticationType,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, serialize_with = "serialize_redacted")]
    pub password: Option<String>,
    #[serde(default, serialize_with = "serialize_redacted")]
    pub authorization_token: Option<String>,
    #[serde(default)]
    pub api_key_id: Option<String>,
    #[serde(default, serialize_with = "serialize_redacted")]
    pub api_key_secret: Option<String>,
    /// Timeout in milliseconds on client calls to Elasticsearch.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,
    /// Constraint on the version of Elasticsearch.
    pub version_req: String,
}

impl StoreConfig<'_> for ElasticsearchParameters {
    const ENV_PREFIX: &'static str = "GORA";

    fn file_sources() -> Vec<&'static str> {
        vec!["elasticsearch.toml"]
    }

    fn root_key() -> Option<&'static str> {
        Some("elasticsearch")
    }
}

impl ElasticsearchParameters {
    /// Layered parameters from the configuration directory, checked with [`Self::validate`].
    pub fn load(overrides: &[String]) -> Result<Self> {
        Self::load_from(&config_dir(), overrides)
    }

    pub fn load_from(dir: &Path, overrides: &[String]) -> Result<Self> {
        let params = Self::get_from(dir, overrides)?;
        params.validate()?;
        Ok(params)
    }

    /// Checks that the credentials needed by the authentication type are set.
    pub fn validate(&self) -> Result<()> {
        let missing = match self.authentication_type {
            AuthenticationType::None => vec![],
            AuthenticationType::Basic => [
                ("username", &self.username),
                ("password", &self.password),
            ]
            .into_iter()
            .filter(|(_, value)| is_blank(value))
            .map(|(key, _)| key)
            .collect(),
            AuthenticationType::Token => [("authorization_token", &self.authorization_token)]
                .into_iter()
                .filter(|(_, value)| is_blank(value))
                .map(|(key, _)| key)
                .collect(),
            AuthenticationType::ApiKey => [
                ("api_key_id", &self.api_key_id),
                ("api_key_secret", &self.api_key_secret),
            ]
            .into_iter()
            .filter(|(_, value)| is_blank(value))
            .map(|(key, _)| key)
            .collect(),
        };

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ElasticClientError::InvalidParameters(format!(
                "authentication type '{}' requires {}",
                self.authentication_type,
                missing.join(", ")
            )))
        }
    }

    pub fn url(&self) -> Result<Url> {
        let url = Url::parse(&format!("{}://{}:{}", self.scheme, self.host, self.port))?;
        Ok(url)
    }

    /// Credentials sent with every request, `None` without authentication.
    pub fn credentials(&self) -> Option<Credentials> {
        match self.authentication_type {
            AuthenticationType::None => None,
            AuthenticationType::Basic => Some(Credentials::Basic(
                self.username.clone()?,
                self.password.clone()?,
            )),
            AuthenticationType::Token => {
                Some(Credentials::Bearer(self.authorization_token.clone()?))
            }
            AuthenticationType::ApiKey => Some(Credentials::ApiKey(
                self.api_key_id.clone()?,
                self.api_key_secret.clone()?,
            )),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Store implementations that can be selected by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Elasticsearch,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DatastoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Create the index of a store on initialization when it is missing.
    #[serde(default = "default_true")]
    pub auto_create_schema: bool,
}

impl Default for DatastoreSettings {
    fn default() -> Self {
        DatastoreSettings {
            backend: StoreBackend::default(),
            auto_create_schema: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MappingSettings {
    pub file: PathBuf,
    /// Check the mapping file against its grammar before reading it.
    #[serde(default = "default_false")]
    pub xsd_validation: bool,
}

/// Everything needed to open a store.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub datastore: DatastoreSettings,
    pub mapping: MappingSettings,
    pub elasticsearch: ElasticsearchParameters,
}

impl StoreConfig<'_> for StoreSettings {
    const ENV_PREFIX: &'static str = "GORA";

    fn file_sources() -> Vec<&'static str> {
        vec!["gora.toml", "elasticsearch.toml"]
    }
}

impl StoreSettings {
    pub fn load(overrides: &[String]) -> Result<Self> {
        Self::load_from(&config_dir(), overrides)
    }

    /// Same as [`Self::load`], relative mapping paths being resolved against `dir`.
    pub fn load_from(dir: &Path, overrides: &[String]) -> Result<Self> {
        let mut settings = Self::get_from(dir, overrides)?;
        if settings.mapping.file.is_relative() {
            settings.mapping.file = dir.join(&settings.mapping.file);
        }
        settings.elasticsearch.validate()?;
        Ok(settings)
    }

    pub fn mapping_path(&self) -> &Path {
        &self.mapping.file
    }
}
