use data_store::MetadataAnalyzer;

use crate::errors::{ElasticClientError, Result};
use crate::metadata::ElasticsearchMetadataAnalyzer;
use crate::settings::{StoreBackend, StoreSettings};

pub type DynMetadataAnalyzer = Box<dyn MetadataAnalyzer<Error = ElasticClientError>>;

/// The analyzer of the backend selected by `datastore.backend`, connected.
pub async fn create_analyzer(settings: &StoreSettings) -> Result<DynMetadataAnalyzer> {
    match settings.datastore.backend {
        StoreBackend::Elasticsearch => {
            let analyzer =
                ElasticsearchMetadataAnalyzer::from_parameters(settings.elasticsearch.clone())
                    .await?;
            Ok(Box::new(analyzer))
        }
    }
}
