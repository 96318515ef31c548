use async_trait::async_trait;

use crate::query::Query;
use crate::Persistent;

/// Persistence of records of type `T` in one backend collection.
#[async_trait]
pub trait DataStore<T: Persistent>: Send + Sync {
    /// Declared schema of the collection (e.g. the parsed mapping file).
    type Mapping;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name of the backend collection holding the records.
    fn schema_name(&self) -> &str;

    fn mapping(&self) -> &Self::Mapping;

    async fn create_schema(&self) -> Result<(), Self::Error>;

    async fn schema_exists(&self) -> Result<bool, Self::Error>;

    async fn delete_schema(&self) -> Result<(), Self::Error>;

    async fn put(&self, key: &str, record: &T) -> Result<(), Self::Error>;

    /// Loads a record, restricted to `fields` (persistent names) when given.
    async fn get(&self, key: &str, fields: Option<&[String]>) -> Result<Option<T>, Self::Error>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, key: &str) -> Result<bool, Self::Error>;

    /// Runs a query, returning `(key, record)` pairs ordered by key.
    async fn execute(&self, query: &Query) -> Result<Vec<(String, T)>, Self::Error>;

    /// Makes previous writes visible to readers.
    async fn flush(&self) -> Result<(), Self::Error>;

    fn new_query(&self) -> Query {
        Query::new()
    }
}
