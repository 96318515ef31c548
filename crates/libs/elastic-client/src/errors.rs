use elasticsearch::http::response::Exception;
use elastic_mapping::MappingError;
use semver::Version;
use serde_json::Value;
use store_config::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ElasticClientError>;

#[derive(Debug, Error)]
pub enum ElasticClientError {
    #[error("Elasticsearch is unreachable: {0}")]
    StoreUnavailable(#[source] elasticsearch::Error),

    #[error("Elasticsearch index not found '{0}'")]
    CollectionNotFound(String),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid connection parameters: {0}")]
    InvalidParameters(String),

    #[error("Elasticsearch error: {0}")]
    ElasticSearchError(#[from] elasticsearch::Error),

    #[error("serde_json error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Invalid json format: {msg} {json}")]
    InvalidJson { msg: String, json: Value },

    #[error("Failed to create elasticsearch index '{0}'")]
    IndexCreationFailed(String),

    #[error("Failed to delete elasticsearch index '{0}'")]
    IndexDeletionFailed(String),

    #[error("Elasticsearch exception: status: {status:?}, error: {error:?}")]
    ElasticSearchHttpError {
        error: elasticsearch::http::response::Error,
        status: Option<u16>,
    },

    #[error("No response from elastic search despite the lack of exception")]
    ElasticsearchFailureWithoutException,

    #[error("Elasticsearch version {0}, is not supported")]
    UnsupportedElasticSearchVersion(Version),

    #[error("Semver parse error: {0}")]
    SemVerError(#[from] semver::Error),

    #[error("Elasticsearch client builder error: {0}")]
    ElasticClientBuilderError(#[from] elasticsearch::http::transport::BuildError),

    #[error("Invalid Elasticsearch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<Exception> for ElasticClientError {
    fn from(exception: Exception) -> Self {
        Self::ElasticSearchHttpError {
            error: exception.error().clone(),
            status: exception.status(),
        }
    }
}
