use serde::Deserialize;
use serde_json::{Map, Value};

/// One line of `GET _cat/indices?format=json`.
#[derive(Debug, Deserialize)]
pub struct ElasticsearchCatIndex {
    pub index: String,
}

#[derive(Debug, Deserialize)]
pub struct ElasticsearchSearchResponse {
    pub hits: ElasticsearchHits,
}

#[derive(Debug, Deserialize)]
pub struct ElasticsearchHits {
    pub hits: Vec<ElasticsearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct ElasticsearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ElasticsearchGetResponse {
    pub found: bool,
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

/// Body of `DELETE /{index}/_doc/{id}`, also returned with a 404 status.
#[derive(Debug, Deserialize)]
pub struct ElasticsearchDeleteResponse {
    pub result: String,
}

impl ElasticsearchSearchResponse {
    pub fn into_hits(self) -> impl Iterator<Item = ElasticsearchHit> {
        self.hits.hits.into_iter()
    }
}
