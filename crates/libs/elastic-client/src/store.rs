use std::marker::PhantomData;

use async_trait::async_trait;
use data_store::{DataStore, Persistent, Query};
use elastic_mapping::{load_class, ElasticsearchMapping, GORA_ID_FIELD};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::errors::{ElasticClientError, Result};
use crate::query::ElasticsearchQuery;
use crate::settings::StoreSettings;
use crate::ElasticSearchClient;

/// Largest page Elasticsearch serves without scrolling (`index.max_result_window`).
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// Index properties of a mapping: every mapped field and the key field.
pub fn index_properties(mapping: &ElasticsearchMapping) -> Map<String, Value> {
    let mut properties: Map<String, Value> = mapping
        .fields()
        .values()
        .map(|field| (field.name.clone(), field.field_type.to_es_mapping()))
        .collect();
    properties.insert(GORA_ID_FIELD.to_string(), json!({ "type": "keyword" }));
    properties
}

/// Records of type `T` stored in the index its mapping points to.
///
/// Documents carry the mapped document field names plus the record key in
/// [`GORA_ID_FIELD`]. Fields of `T` without a mapping are not stored, so they
/// should be `#[serde(default)]`, as should any field left out of a projection.
#[derive(Debug)]
pub struct ElasticsearchStore<T> {
    client: ElasticSearchClient,
    mapping: ElasticsearchMapping,
    _record: PhantomData<fn() -> T>,
}

impl<T: Persistent> ElasticsearchStore<T> {
    /// Connects to the cluster and initializes the store.
    pub async fn from_settings(settings: &StoreSettings) -> Result<Self> {
        let client = ElasticSearchClient::conn(settings.elasticsearch.clone()).await?;
        Self::initialize(client, settings).await
    }

    /// Reads the mapping of `T` and creates its index if allowed and needed.
    #[tracing::instrument(skip(client, settings), fields(class = T::class_name()))]
    pub async fn initialize(client: ElasticSearchClient, settings: &StoreSettings) -> Result<Self> {
        let mapping = load_class(
            settings.mapping_path(),
            T::class_name(),
            settings.mapping.xsd_validation,
        )?;
        let store = Self::with_mapping(client, mapping);

        if settings.datastore.auto_create_schema && !store.schema_exists().await? {
            info!("creating index '{}'", store.schema_name());
            store.create_schema().await?;
        }
        Ok(store)
    }

    pub fn with_mapping(client: ElasticSearchClient, mapping: ElasticsearchMapping) -> Self {
        ElasticsearchStore {
            client,
            mapping,
            _record: PhantomData,
        }
    }

    pub fn client(&self) -> &ElasticSearchClient {
        &self.client
    }

    pub fn query(&self) -> ElasticsearchQuery<'_, T> {
        ElasticsearchQuery::new(self)
    }

    pub fn properties(&self) -> Map<String, Value> {
        index_properties(&self.mapping)
    }

    fn to_document(&self, key: &str, record: &T) -> Result<Value> {
        let json = serde_json::to_value(record)?;
        let Value::Object(values) = json else {
            return Err(ElasticClientError::InvalidJson {
                msg: format!("expected {} to serialize as a JSON object", T::class_name()),
                json,
            });
        };

        let mut document = Map::new();
        for (name, value) in values {
            match self.mapping.field_for(&name) {
                Some(field) => {
                    document.insert(field.name.clone(), value);
                }
                None => debug!("field '{}' of {} is not mapped", name, T::class_name()),
            }
        }
        document.insert(GORA_ID_FIELD.to_string(), Value::String(key.to_string()));
        Ok(Value::Object(document))
    }

    fn from_document(&self, mut source: Map<String, Value>, fields: Option<&[String]>) -> Result<T> {
        let record: Map<String, Value> = self
            .mapping
            .persistent_fields()
            .filter(|(persistent, _)| {
                fields.map_or(true, |fields| fields.iter().any(|f| f.as_str() == *persistent))
            })
            .filter_map(|(persistent, doc)| {
                source
                    .remove(doc)
                    .map(|value| (persistent.to_string(), value))
            })
            .collect();
        Ok(serde_json::from_value(Value::Object(record))?)
    }

    /// Document field names of the requested persistent fields.
    fn doc_fields(&self, fields: &[String]) -> Vec<String> {
        fields
            .iter()
            .filter_map(|name| match self.mapping.field_for(name) {
                Some(field) => Some(field.name.clone()),
                None => {
                    warn!("ignoring unmapped field '{}' of {}", name, T::class_name());
                    None
                }
            })
            .collect()
    }

    fn search_body(&self, query: &Query) -> Value {
        let key_query = match (query.start_key(), query.end_key()) {
            (Some(start), Some(end)) if start == end => json!({ "term": { GORA_ID_FIELD: start } }),
            (None, None) => json!({ "match_all": {} }),
            (start, end) => {
                let mut range = Map::new();
                if let Some(start) = start {
                    range.insert("gte".to_string(), json!(start));
                }
                if let Some(end) = end {
                    range.insert("lte".to_string(), json!(end));
                }
                json!({ "range": { GORA_ID_FIELD: range } })
            }
        };

        let mut body = json!({
            "query": key_query,
            "sort": [{ GORA_ID_FIELD: "asc" }],
            "size": query.limit().unwrap_or(MAX_RESULT_WINDOW).min(MAX_RESULT_WINDOW),
        });
        if let Some(fields) = query.fields() {
            let mut source = self.doc_fields(fields);
            source.push(GORA_ID_FIELD.to_string());
            body["_source"] = json!(source);
        }
        body
    }
}

#[async_trait]
impl<T: Persistent> DataStore<T> for ElasticsearchStore<T> {
    type Mapping = ElasticsearchMapping;
    type Error = ElasticClientError;

    fn schema_name(&self) -> &str {
        self.mapping.index_name()
    }

    fn mapping(&self) -> &ElasticsearchMapping {
        &self.mapping
    }

    async fn create_schema(&self) -> Result<()> {
        self.client
            .create_index(self.schema_name(), self.properties())
            .await
    }

    async fn schema_exists(&self) -> Result<bool> {
        self.client.index_exists(self.schema_name()).await
    }

    async fn delete_schema(&self) -> Result<()> {
        self.client.delete_index(self.schema_name()).await
    }

    async fn put(&self, key: &str, record: &T) -> Result<()> {
        let document = self.to_document(key, record)?;
        self.client
            .index_document(self.schema_name(), key, document)
            .await
    }

    async fn get(&self, key: &str, fields: Option<&[String]>) -> Result<Option<T>> {
        match self.client.get_document(self.schema_name(), key).await? {
            Some(source) => self.from_document(source, fields).map(Some),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.client.delete_document(self.schema_name(), key).await
    }

    async fn execute(&self, query: &Query) -> Result<Vec<(String, T)>> {
        let hits = self
            .client
            .search_documents(self.schema_name(), self.search_body(query))
            .await?;

        hits.into_iter()
            .map(|hit| {
                let record = self.from_document(hit.source, query.fields())?;
                Ok::<_, ElasticClientError>((hit.id, record))
            })
            .collect()
    }

    async fn flush(&self) -> Result<()> {
        self.client.refresh_index(self.schema_name()).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use elastic_mapping::{DataType, Field, FieldType};
    use serde::{Deserialize, Serialize};
    use speculoos::prelude::*;

    use super::*;
    use crate::settings::{AuthenticationType, ElasticsearchParameters, Scheme};

    #[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Employee {
        #[serde(default)]
        name: String,
        #[serde(default)]
        date_of_birth: i64,
        #[serde(default)]
        salary: i32,
        #[serde(default, skip_serializing)]
        nickname: Option<String>,
    }

    impl Persistent for Employee {
        fn class_name() -> &'static str {
            "Employee"
        }
    }

    fn store() -> ElasticsearchStore<Employee> {
        let params = ElasticsearchParameters {
            host: "localhost".to_string(),
            port: 9200,
            scheme: Scheme::Http,
            authentication_type: AuthenticationType::None,
            username: None,
            password: None,
            authorization_token: None,
            api_key_id: None,
            api_key_secret: None,
            timeout: Duration::from_secs(1),
            version_req: ">=7.0.0".to_string(),
        };
        let mut mapping = ElasticsearchMapping::new("Employee", "frontier");
        mapping.add_field("name", Field::new("name", DataType::Text));
        mapping.add_field("dateOfBirth", Field::new("date_of_birth", DataType::Long));
        mapping.add_field("salary", Field::new("salary", FieldType::scaled_float(100)));
        ElasticsearchStore::with_mapping(
            ElasticSearchClient::new(params).expect("client"),
            mapping,
        )
    }

    #[test]
    fn should_write_documents_with_doc_field_names_and_key() -> anyhow::Result<()> {
        let employee = Employee {
            name: "Ada".to_string(),
            date_of_birth: 1815,
            salary: 1000,
            nickname: None,
        };

        let document = store().to_document("ada", &employee)?;

        assert_that!(document).is_equal_to(json!({
            "name": "Ada",
            "date_of_birth": 1815,
            "salary": 1000,
            "gora_id": "ada",
        }));
        Ok(())
    }

    #[test]
    fn should_read_back_persistent_names_and_projection() -> anyhow::Result<()> {
        let source = json!({
            "name": "Ada",
            "date_of_birth": 1815,
            "salary": 1000,
            "gora_id": "ada",
        });
        let Value::Object(source) = source else {
            unreachable!()
        };

        let store = store();
        let full = store.from_document(source.clone(), None)?;
        assert_that!(full.date_of_birth).is_equal_to(1815);

        let projected = store.from_document(source, Some(&["name".to_string()]))?;
        assert_that!(projected).is_equal_to(Employee {
            name: "Ada".to_string(),
            ..Default::default()
        });
        Ok(())
    }

    #[test]
    fn should_declare_mapped_fields_and_key_field() {
        let properties = store().properties();

        assert_that!(properties.len()).is_equal_to(4);
        assert_that!(properties["gora_id"]).is_equal_to(json!({ "type": "keyword" }));
        assert_that!(properties["salary"])
            .is_equal_to(json!({ "type": "scaled_float", "scaling_factor": 100 }));
        assert_that!(properties.contains_key("dateOfBirth")).is_false();
    }

    #[test]
    fn should_query_key_ranges_sorted_by_key() {
        let store = store();

        let mut query = Query::new();
        query.set_key("ada");
        let body = store.search_body(&query);
        assert_that!(body["query"]).is_equal_to(json!({ "term": { "gora_id": "ada" } }));
        assert_that!(body["sort"]).is_equal_to(json!([{ "gora_id": "asc" }]));

        let mut query = Query::new();
        query
            .set_start_key("a")
            .set_limit(5)
            .set_fields(["dateOfBirth", "unknown"]);
        let body = store.search_body(&query);
        assert_that!(body["query"]).is_equal_to(json!({ "range": { "gora_id": { "gte": "a" } } }));
        assert_that!(body["size"]).is_equal_to(json!(5));
        assert_that!(body["_source"]).is_equal_to(json!(["date_of_birth", "gora_id"]));

        let body = store.search_body(&Query::new());
        assert_that!(body["query"]).is_equal_to(json!({ "match_all": {} }));
        assert_that!(body["size"]).is_equal_to(json!(MAX_RESULT_WINDOW));
        assert_that!(body.get("_source")).is_none();
    }
}
