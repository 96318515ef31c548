use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::Elasticsearch;
use semver::{Version, VersionReq};
use serde_json::Value;
use tracing::info;

use crate::errors::{ElasticClientError, Result};
use crate::internal::failure;
use crate::settings::ElasticsearchParameters;
use crate::ElasticSearchClient;

impl ElasticSearchClient {
    /// Connects to the cluster described by `config`, refusing clusters whose
    /// version does not match `config.version_req`.
    #[tracing::instrument(skip(config), fields(host = %config.host, port = config.port))]
    pub async fn conn(config: ElasticsearchParameters) -> Result<Self> {
        let version_req = VersionReq::parse(&config.version_req)?;
        let client = Self::new(config)?;

        let version = client.version().await?;
        if !version_req.matches(&version) {
            return Err(ElasticClientError::UnsupportedElasticSearchVersion(version));
        }
        info!("connected to elasticsearch {}", version);

        Ok(client)
    }

    /// Builds the client without contacting the cluster.
    pub fn new(config: ElasticsearchParameters) -> Result<Self> {
        let pool = SingleNodeConnectionPool::new(config.url()?);
        let mut builder = TransportBuilder::new(pool);
        if let Some(credentials) = config.credentials() {
            builder = builder.auth(credentials);
        }
        let transport = builder.build()?;

        Ok(ElasticSearchClient {
            client: Elasticsearch::new(transport),
            config,
        })
    }

    /// Version number reported by the cluster.
    pub async fn version(&self) -> Result<Version> {
        let response = self
            .client
            .info()
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        if !response.status_code().is_success() {
            return Err(failure(response, None).await);
        }

        // Response similar to:
        // { "name": "node-1", "version": { "number": "7.17.9", ... }, "tagline": "You Know, for Search" }
        let json = response.json::<Value>().await?;
        let number = json
            .as_object()
            .ok_or(ElasticClientError::InvalidJson {
                msg: String::from("expected JSON object"),
                json: json.clone(),
            })?
            .get("version")
            .and_then(|version| version.get("number"))
            .ok_or(ElasticClientError::InvalidJson {
                msg: String::from("expected 'version.number'"),
                json: json.clone(),
            })?
            .as_str()
            .ok_or(ElasticClientError::InvalidJson {
                msg: String::from("expected JSON string"),
                json: json.clone(),
            })?;

        Ok(Version::parse(number)?)
    }
}
