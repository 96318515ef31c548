use std::fmt;

use async_trait::async_trait;
use data_store::{CollectionMetadata, MetadataAnalyzer};
use elastic_mapping::{ElasticsearchMapping, GORA_ID_FIELD};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::{ElasticClientError, Result};
use crate::settings::ElasticsearchParameters;
use crate::ElasticSearchClient;

/// Label reported by [`ElasticsearchMetadataAnalyzer::store_type`].
pub const STORE_TYPE: &str = "ELASTICSEARCH";

/// Reads indices and their mappings straight from the cluster.
#[derive(Clone, Debug)]
pub struct ElasticsearchMetadataAnalyzer {
    client: ElasticSearchClient,
}

impl ElasticsearchMetadataAnalyzer {
    pub fn new(client: ElasticSearchClient) -> Self {
        ElasticsearchMetadataAnalyzer { client }
    }

    pub async fn from_parameters(params: ElasticsearchParameters) -> Result<Self> {
        let client = ElasticSearchClient::conn(params).await?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl MetadataAnalyzer for ElasticsearchMetadataAnalyzer {
    type Error = ElasticClientError;

    fn store_type(&self) -> &'static str {
        STORE_TYPE
    }

    /// Every index except hidden and system ones (leading `.`).
    async fn tables_names(&self) -> Result<Vec<String>> {
        let indices = self.client.list_indices().await?;
        Ok(indices
            .into_iter()
            .filter(|index| !index.starts_with('.'))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn table_info(&self, collection_name: &str) -> Result<CollectionMetadata> {
        let properties = self.client.index_properties(collection_name).await?;

        let mut metadata = CollectionMetadata::new(collection_name);
        let mut key_type = None;
        for (name, definition) in &properties {
            if name == GORA_ID_FIELD {
                key_type = Some(type_label(definition));
            } else {
                metadata.push(name.as_str(), type_label(definition));
            }
        }
        metadata.push(GORA_ID_FIELD, key_type.unwrap_or("keyword"));

        debug!("{} fields in '{}'", metadata.len(), collection_name);
        Ok(metadata)
    }
}

/// Type of a live field; objects are only typed implicitly.
fn type_label(definition: &Value) -> &str {
    definition
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("object")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeMismatch {
    pub field: String,
    pub declared: String,
    pub found: String,
}

/// Differences between a declared mapping and the schema found in the store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDiff {
    pub collection_name: String,
    /// Declared document fields the index does not have.
    pub missing: Vec<String>,
    /// Fields of the index that are not declared, the key field aside.
    pub unexpected: Vec<String>,
    pub mismatched: Vec<TypeMismatch>,
}

impl SchemaDiff {
    pub fn between(mapping: &ElasticsearchMapping, metadata: &CollectionMetadata) -> Self {
        let mut diff = SchemaDiff {
            collection_name: metadata.collection_name.clone(),
            ..Default::default()
        };

        for (name, field) in mapping.fields() {
            let declared = field.data_type().as_str();
            match metadata.type_of(name) {
                None => diff.missing.push(name.clone()),
                Some(found) if found != declared => diff.mismatched.push(TypeMismatch {
                    field: name.clone(),
                    declared: declared.to_string(),
                    found: found.to_string(),
                }),
                Some(_) => {}
            }
        }

        diff.unexpected = metadata
            .iter()
            .filter(|(key, _)| *key != GORA_ID_FIELD && mapping.field(key).is_none())
            .map(|(key, _)| key.to_string())
            .collect();

        diff.missing.sort();
        diff.unexpected.sort();
        diff.mismatched.sort_by(|a, b| a.field.cmp(&b.field));
        diff
    }

    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.mismatched.is_empty()
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consistent() {
            return write!(f, "'{}' matches its mapping", self.collection_name);
        }
        writeln!(f, "'{}' differs from its mapping:", self.collection_name)?;
        for name in &self.missing {
            writeln!(f, "  missing field '{name}'")?;
        }
        for name in &self.unexpected {
            writeln!(f, "  unexpected field '{name}'")?;
        }
        for mismatch in &self.mismatched {
            writeln!(
                f,
                "  field '{}' declared {} but found {}",
                mismatch.field, mismatch.declared, mismatch.found
            )?;
        }
        Ok(())
    }
}
