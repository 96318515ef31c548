//! Elasticsearch implementation of the data store and metadata analyzer.
//!
//! Stores take their index name and field types from a mapping file (see
//! [`elastic_mapping`]), while [`ElasticsearchMetadataAnalyzer`] reports what
//! the cluster actually holds. [`SchemaDiff`] compares the two.

use elasticsearch::Elasticsearch;

pub mod dto;
pub mod errors;
pub mod factory;
pub mod internal;
pub mod metadata;
pub mod query;
pub mod remote;
pub mod settings;
pub mod store;

pub use errors::ElasticClientError;
pub use factory::create_analyzer;
pub use metadata::{ElasticsearchMetadataAnalyzer, SchemaDiff, STORE_TYPE};
pub use query::ElasticsearchQuery;
pub use settings::{ElasticsearchParameters, StoreSettings};
pub use store::{index_properties, ElasticsearchStore};

#[derive(Clone, Debug)]
pub struct ElasticSearchClient {
    /// Elasticsearch client
    pub client: Elasticsearch,
    /// Client configuration
    pub config: ElasticsearchParameters,
}
