//! A throw-away Elasticsearch node for integration tests.
//!
//! Tests build an [`ElasticsearchTestDriver`] and hand it to whatever needs a
//! cluster. Setting `TEST_CONTAINER=false` skips docker and uses the node
//! already listening on `localhost:9200`.

use std::path::Path;
use std::time::Duration;

use bollard::Docker;
use elastic_client::settings::{ElasticsearchParameters, StoreSettings};
use elastic_client::ElasticSearchClient;

use crate::container::Container;
use crate::wait::ReadyCondition;

mod container;
mod port;
mod wait;

const IMAGE: &str = "docker.elastic.co/elasticsearch/elasticsearch:7.17.9";
const CONTAINER_NAME: &str = "gora_test_es";

/// Overrides pointing the default configuration at the test node.
fn test_overrides() -> Vec<String> {
    vec![
        "host='localhost'".to_string(),
        "port=9200".to_string(),
        "authentication_type='none'".to_string(),
        "timeout=10000".to_string(),
    ]
}

pub struct ElasticsearchTestDriver {
    params: ElasticsearchParameters,
}

impl ElasticsearchTestDriver {
    /// Makes sure the node runs and holds no index.
    pub async fn start() -> anyhow::Result<Self> {
        let params = ElasticsearchParameters::load(&test_overrides())?;

        if std::env::var("TEST_CONTAINER") != Ok("false".to_string()) {
            let container = Container {
                image: IMAGE.to_string(),
                name: CONTAINER_NAME.to_string(),
                client: Docker::connect_with_socket_defaults()?,
                env: vec![
                    ("xpack.security.enabled".to_string(), "false".to_string()),
                    ("discovery.type".to_string(), "single-node".to_string()),
                ],
                ready_condition: ReadyCondition::HttpPull {
                    url: params.url()?.to_string(),
                    expect: r#""tagline""#.to_string(),
                    interval: Duration::from_millis(100),
                },
                memory: Some(1073741824),
                exposed_port: vec![(9200, params.port)],
            };

            if !container.is_running().await {
                container.run().await?;
            }
        }

        let driver = ElasticsearchTestDriver { params };
        driver.cleanup().await?;
        Ok(driver)
    }

    pub fn parameters(&self) -> &ElasticsearchParameters {
        &self.params
    }

    /// Store settings reading `mapping`, connected to the test node.
    pub fn settings(&self, mapping: &Path, validate: bool) -> anyhow::Result<StoreSettings> {
        let mut overrides: Vec<String> = test_overrides()
            .into_iter()
            .map(|value| format!("elasticsearch.{value}"))
            .collect();
        overrides.push(format!("mapping.xsd_validation={validate}"));

        let mut settings = StoreSettings::load(&overrides)?;
        settings.mapping.file = mapping.to_path_buf();
        Ok(settings)
    }

    pub async fn client(&self) -> anyhow::Result<ElasticSearchClient> {
        Ok(ElasticSearchClient::conn(self.params.clone()).await?)
    }

    /// Deletes every index left by previous tests.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let client = self.client().await?;
        for index in client.list_indices().await? {
            if !index.starts_with('.') {
                client.delete_index(&index).await?;
            }
        }
        Ok(())
    }
}
