use data_store::{DataStore, Persistent, Query};

use crate::errors::Result;
use crate::store::ElasticsearchStore;

/// A [`Query`] bound to the store that runs it.
pub struct ElasticsearchQuery<'a, T> {
    store: &'a ElasticsearchStore<T>,
    query: Query,
}

impl<'a, T: Persistent> ElasticsearchQuery<'a, T> {
    pub fn new(store: &'a ElasticsearchStore<T>) -> Self {
        ElasticsearchQuery {
            store,
            query: store.new_query(),
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.set_fields(fields);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.query.set_key(key);
        self
    }

    pub fn start_key(mut self, key: impl Into<String>) -> Self {
        self.query.set_start_key(key);
        self
    }

    pub fn end_key(mut self, key: impl Into<String>) -> Self {
        self.query.set_end_key(key);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.set_limit(limit);
        self
    }

    pub fn as_query(&self) -> &Query {
        &self.query
    }

    pub async fn execute(&self) -> Result<Vec<(String, T)>> {
        self.store.execute(&self.query).await
    }
}
