use elasticsearch::cat::CatIndicesParts;
use elasticsearch::http::response::Response;
use elasticsearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetMappingParts,
    IndicesRefreshParts,
};
use elasticsearch::{DeleteParts, GetParts, IndexParts, SearchParts};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::dto::{
    ElasticsearchCatIndex, ElasticsearchDeleteResponse, ElasticsearchGetResponse,
    ElasticsearchHit, ElasticsearchSearchResponse,
};
use crate::errors::{ElasticClientError, Result};
use crate::ElasticSearchClient;

const NOT_FOUND: u16 = 404;

/// Turns an unsuccessful response into an error. A 404 on `index` means the
/// index does not exist.
pub(crate) async fn failure(response: Response, index: Option<&str>) -> ElasticClientError {
    if let Some(index) = index {
        if response.status_code().as_u16() == NOT_FOUND {
            return ElasticClientError::CollectionNotFound(index.to_string());
        }
    }
    match response.exception().await {
        Ok(Some(exception)) => ElasticClientError::from(exception),
        Ok(None) => ElasticClientError::ElasticsearchFailureWithoutException,
        Err(err) => ElasticClientError::from(err),
    }
}

fn acknowledged(json: &Value) -> Result<bool> {
    json.as_object()
        .ok_or(ElasticClientError::InvalidJson {
            msg: String::from("expected JSON object"),
            json: json.clone(),
        })?
        .get("acknowledged")
        .ok_or(ElasticClientError::InvalidJson {
            msg: String::from("expected 'acknowledged'"),
            json: json.clone(),
        })?
        .as_bool()
        .ok_or(ElasticClientError::InvalidJson {
            msg: String::from("expected JSON bool"),
            json: json.clone(),
        })
}

impl ElasticSearchClient {
    /// Names of every index, in the order returned by the cluster.
    pub async fn list_indices(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .cat()
            .indices(CatIndicesParts::None)
            .format("json")
            .h(&["index"])
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        if !response.status_code().is_success() {
            return Err(failure(response, None).await);
        }

        let indices = response.json::<Vec<ElasticsearchCatIndex>>().await?;
        Ok(indices.into_iter().map(|index| index.index).collect())
    }

    /// The `properties` of the live mapping of `index`.
    pub async fn index_properties(&self, index: &str) -> Result<Map<String, Value>> {
        let response = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[index]))
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        if !response.status_code().is_success() {
            return Err(failure(response, Some(index)).await);
        }

        // Response similar to:
        // { "frontier": { "mappings": { "properties": { "name": { "type": "text" }, ... } } } }
        // The key is the concrete index name, which differs from `index` for an alias.
        let json = response.json::<Value>().await?;
        let indices = json.as_object().ok_or(ElasticClientError::InvalidJson {
            msg: String::from("expected JSON object"),
            json: json.clone(),
        })?;
        let mappings = indices
            .get(index)
            .or_else(|| indices.values().next())
            .ok_or_else(|| ElasticClientError::CollectionNotFound(index.to_string()))?;

        let properties = mappings
            .pointer("/mappings/properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Ok(properties)
    }

    pub async fn index_exists(&self, index: &str) -> Result<bool> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        match response.status_code().as_u16() {
            NOT_FOUND => Ok(false),
            _ if response.status_code().is_success() => Ok(true),
            _ => Err(failure(response, None).await),
        }
    }

    /// Creates `index` with the given field `properties`.
    pub async fn create_index(&self, index: &str, properties: Map<String, Value>) -> Result<()> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(json!({
                "mappings": {
                    "properties": properties
                }
            }))
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        if !response.status_code().is_success() {
            return Err(failure(response, None).await);
        }

        // Response similar to:
        // Object({"acknowledged": Bool(true), "index": String("name"), "shards_acknowledged": Bool(true)})
        let json = response.json::<Value>().await?;
        if acknowledged(&json)? {
            Ok(())
        } else {
            Err(ElasticClientError::IndexCreationFailed(index.to_string()))
        }
    }

    pub async fn delete_index(&self, index: &str) -> Result<()> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        if !response.status_code().is_success() {
            return Err(failure(response, Some(index)).await);
        }

        let json = response.json::<Value>().await?;
        if acknowledged(&json)? {
            Ok(())
        } else {
            Err(ElasticClientError::IndexDeletionFailed(index.to_string()))
        }
    }

    pub async fn refresh_index(&self, index: &str) -> Result<()> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        // Note We won't analyze the msg of the response.
        if response.status_code().is_success() {
            Ok(())
        } else {
            Err(failure(response, Some(index)).await)
        }
    }

    pub async fn index_document(&self, index: &str, id: &str, document: Value) -> Result<()> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(document)
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        if response.status_code().is_success() {
            debug!("indexed document '{}' in '{}'", id, index);
            Ok(())
        } else {
            Err(failure(response, Some(index)).await)
        }
    }

    /// The source of document `id`, `None` if the index holds no such document.
    pub async fn get_document(&self, index: &str, id: &str) -> Result<Option<Map<String, Value>>> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        let status = response.status_code();
        if !status.is_success() && status.as_u16() != NOT_FOUND {
            return Err(failure(response, None).await);
        }

        // A missing document comes as { "found": false } with a 404, a missing
        // index as an exception with the same status.
        let json = response.json::<Value>().await?;
        if json.get("found").is_none() {
            return Err(ElasticClientError::CollectionNotFound(index.to_string()));
        }
        let document: ElasticsearchGetResponse = serde_json::from_value(json)?;
        Ok(document.found.then_some(document.source))
    }

    /// Returns `false` if there was no document `id`.
    pub async fn delete_document(&self, index: &str, id: &str) -> Result<bool> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        let status = response.status_code();
        if !status.is_success() && status.as_u16() != NOT_FOUND {
            return Err(failure(response, None).await);
        }

        let json = response.json::<Value>().await?;
        if json.get("result").is_none() {
            return Err(ElasticClientError::CollectionNotFound(index.to_string()));
        }
        let deleted: ElasticsearchDeleteResponse = serde_json::from_value(json)?;
        Ok(deleted.result == "deleted")
    }

    pub async fn search_documents(&self, index: &str, body: Value) -> Result<Vec<ElasticsearchHit>> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body)
            .request_timeout(self.config.timeout)
            .send()
            .await
            .map_err(ElasticClientError::StoreUnavailable)?;

        if !response.status_code().is_success() {
            return Err(failure(response, Some(index)).await);
        }

        let body = response.json::<ElasticsearchSearchResponse>().await?;
        Ok(body.into_hits().collect())
    }
}
