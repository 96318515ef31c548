use async_trait::async_trait;
use serde::Serialize;

/// Schema of one collection as observed in a live store.
///
/// Keys and types are parallel: the type of the n-th key is the n-th type.
/// They only grow together through [`CollectionMetadata::push`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionMetadata {
    pub collection_name: String,
    document_keys: Vec<String>,
    document_types: Vec<String>,
}

impl CollectionMetadata {
    pub fn new(collection_name: impl Into<String>) -> Self {
        CollectionMetadata {
            collection_name: collection_name.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, key: impl Into<String>, doc_type: impl Into<String>) {
        self.document_keys.push(key.into());
        self.document_types.push(doc_type.into());
    }

    pub fn document_keys(&self) -> &[String] {
        &self.document_keys
    }

    pub fn document_types(&self) -> &[String] {
        &self.document_types
    }

    pub fn len(&self) -> usize {
        self.document_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document_keys.is_empty()
    }

    pub fn type_of(&self, key: &str) -> Option<&str> {
        self.document_keys
            .iter()
            .position(|k| k == key)
            .and_then(|idx| self.document_types.get(idx))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.document_keys
            .iter()
            .map(String::as_str)
            .zip(self.document_types.iter().map(String::as_str))
    }
}

/// Read-only introspection of a live store, independent of any mapping file.
///
/// Nothing is cached: every call queries the backend again.
#[async_trait]
pub trait MetadataAnalyzer: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Constant label of the backend, e.g. `ELASTICSEARCH`.
    fn store_type(&self) -> &'static str;

    /// Names of the existing collections, in backend order.
    async fn tables_names(&self) -> Result<Vec<String>, Self::Error>;

    async fn table_info(&self, collection_name: &str) -> Result<CollectionMetadata, Self::Error>;
}
