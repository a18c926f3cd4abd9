use crate::error::IndexError;
use crate::models::TextFragment;
use crate::traits::FragmentIndex;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Client for a ChromaDB collection over its HTTP API. The collection embeds
/// documents server-side; this client only moves text and metadata.
pub struct ChromaStore {
    client: Client,
    endpoint: String,
    collection_id: String,
    collection_name: String,
}

impl ChromaStore {
    /// Resolves (or creates) the named collection and binds to its id.
    pub async fn connect(
        endpoint: impl Into<String>,
        collection: impl Into<String>,
    ) -> Result<Self, IndexError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let collection_name = collection.into();
        let client = Client::new();

        let response = client
            .post(format!("{endpoint}/api/v1/collections"))
            .json(&json!({
                "name": collection_name,
                "get_or_create": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        let collection_id = payload
            .pointer("/id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                IndexError::Request("chroma collection response carried no id".to_string())
            })?
            .to_string();

        Ok(Self {
            client,
            endpoint,
            collection_id,
            collection_name,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    fn collection_url(&self, operation: &str) -> String {
        format!(
            "{}/api/v1/collections/{}/{operation}",
            self.endpoint, self.collection_id
        )
    }
}

#[async_trait]
impl FragmentIndex for ChromaStore {
    async fn add_fragments(&self, fragments: &[TextFragment]) -> Result<(), IndexError> {
        if fragments.is_empty() {
            return Ok(());
        }

        let ids: Vec<&str> = fragments.iter().map(|f| f.fragment_id.as_str()).collect();
        let documents: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        let metadatas: Vec<Value> = fragments
            .iter()
            .map(|f| json!({"source": f.source, "index": f.position}))
            .collect();

        let response = self
            .client
            .post(self.collection_url("add"))
            .json(&json!({
                "ids": ids,
                "documents": documents,
                "metadatas": metadatas,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }

    async fn query_similar(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>, IndexError> {
        let response = self
            .client
            .post(self.collection_url("query"))
            .json(&json!({
                "query_texts": [query],
                "n_results": top_k,
                "include": ["documents"],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        let documents = parsed
            .pointer("/documents/0")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(documents
            .into_iter()
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect())
    }
}
