//! Pinecone REST backend for [`VectorIndex`].

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::vector_index::{
    BoxFuture, IndexDescription, IndexSpec, Metric, VectorIndex, VectorIndexError, VectorRecord,
};

const API_VERSION: &str = "2024-07";

/// Thin client over the Pinecone control plane (index management) and the
/// per-index data plane (upserts).
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    control_url: String,
    hosts: RwLock<HashMap<String, String>>,
}

impl std::fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeIndex")
            .field("api_key", &"<redacted>")
            .field("control_url", &self.control_url)
            .finish_non_exhaustive()
    }
}

impl PineconeIndex {
    /// `client` carries the timeout and TLS settings; this type only adds
    /// the Pinecone auth and version headers.
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: String, control_url: &str) -> Self {
        Self {
            client,
            api_key,
            control_url: control_url.trim_end_matches('/').to_owned(),
            hosts: RwLock::new(HashMap::new()),
        }
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .header("Accept", "application/json")
    }

    fn remember(&self, description: &IndexDescription) {
        if let Some(host) = &description.host
            && let Ok(mut hosts) = self.hosts.write()
        {
            hosts.insert(description.name.clone(), data_plane_url(host));
        }
    }

    fn cached_host(&self, index: &str) -> Option<String> {
        self.hosts.read().ok()?.get(index).cloned()
    }

    async fn host_for(&self, index: &str) -> Result<String, VectorIndexError> {
        if let Some(host) = self.cached_host(index) {
            return Ok(host);
        }
        let description = self
            .describe_inner(index)
            .await
            .map_err(|e| VectorIndexError::Upsert(e.to_string()))?;
        description
            .host
            .as_deref()
            .map(data_plane_url)
            .ok_or_else(|| VectorIndexError::Upsert(format!("index {index} has no host yet")))
    }

    async fn describe_inner(&self, name: &str) -> Result<IndexDescription, VectorIndexError> {
        let response = self
            .request(
                reqwest::Method::GET,
                format!("{}/indexes/{name}", self.control_url),
            )
            .send()
            .await
            .map_err(connection)?;
        let body = read_body(response, VectorIndexError::Describe).await?;
        let model: IndexModel = serde_json::from_str(&body)
            .map_err(|e| VectorIndexError::Serialization(e.to_string()))?;
        let description = model.into_description();
        self.remember(&description);
        Ok(description)
    }
}

fn connection(e: reqwest::Error) -> VectorIndexError {
    VectorIndexError::Connection(e.to_string())
}

fn data_plane_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_owned()
    } else {
        format!("https://{host}")
    }
}

/// Read the body of a response, turning non-2xx statuses into `err`.
async fn read_body(
    response: reqwest::Response,
    err: fn(String) -> VectorIndexError,
) -> Result<String, VectorIndexError> {
    let status = response.status();
    let body = response.text().await.map_err(connection)?;
    if status.is_success() {
        return Ok(body);
    }
    tracing::error!("Pinecone API error {status}: {body}");
    Err(err(format!("status {status}: {}", error_message(&body))))
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError {
            error: Some(ApiErrorBody { message }),
            ..
        })
        | Ok(ApiError {
            message: Some(message),
            ..
        }) => message,
        _ => body.chars().take(200).collect(),
    }
}

impl VectorIndex for PineconeIndex {
    fn list_indexes(&self) -> BoxFuture<'_, Result<Vec<IndexDescription>, VectorIndexError>> {
        Box::pin(async move {
            let response = self
                .request(
                    reqwest::Method::GET,
                    format!("{}/indexes", self.control_url),
                )
                .send()
                .await
                .map_err(connection)?;
            let body = read_body(response, VectorIndexError::List).await?;
            let list: ListIndexesResponse = serde_json::from_str(&body)
                .map_err(|e| VectorIndexError::Serialization(e.to_string()))?;
            let descriptions: Vec<IndexDescription> = list
                .indexes
                .into_iter()
                .map(IndexModel::into_description)
                .collect();
            for d in &descriptions {
                self.remember(d);
            }
            Ok(descriptions)
        })
    }

    fn create_index(
        &self,
        spec: &IndexSpec,
    ) -> BoxFuture<'_, Result<IndexDescription, VectorIndexError>> {
        let spec = spec.clone();
        Box::pin(async move {
            let body = CreateIndexRequest {
                name: &spec.name,
                dimension: spec.dimension,
                metric: spec.metric,
                spec: CreateIndexSpec {
                    serverless: ServerlessSpec {
                        cloud: &spec.cloud,
                        region: &spec.region,
                    },
                },
            };
            let response = self
                .request(
                    reqwest::Method::POST,
                    format!("{}/indexes", self.control_url),
                )
                .json(&body)
                .send()
                .await
                .map_err(connection)?;
            let body = read_body(response, VectorIndexError::Create).await?;
            let model: IndexModel = serde_json::from_str(&body)
                .map_err(|e| VectorIndexError::Serialization(e.to_string()))?;
            let description = model.into_description();
            self.remember(&description);
            Ok(description)
        })
    }

    fn describe_index(
        &self,
        name: &str,
    ) -> BoxFuture<'_, Result<IndexDescription, VectorIndexError>> {
        let name = name.to_owned();
        Box::pin(async move { self.describe_inner(&name).await })
    }

    fn upsert(
        &self,
        index: &str,
        namespace: &str,
        records: Vec<VectorRecord>,
    ) -> BoxFuture<'_, Result<usize, VectorIndexError>> {
        let index = index.to_owned();
        let namespace = namespace.to_owned();
        Box::pin(async move {
            if records.is_empty() {
                return Ok(0);
            }
            let host = self.host_for(&index).await?;
            let body = UpsertRequest {
                vectors: &records,
                namespace: &namespace,
            };
            let response = self
                .request(reqwest::Method::POST, format!("{host}/vectors/upsert"))
                .json(&body)
                .send()
                .await
                .map_err(|e| VectorIndexError::Upsert(e.to_string()))?;
            let body = read_body(response, VectorIndexError::Upsert).await?;
            let resp: UpsertResponse = serde_json::from_str(&body)
                .map_err(|e| VectorIndexError::Serialization(e.to_string()))?;
            Ok(resp.upserted_count)
        })
    }
}

#[derive(Deserialize)]
struct ListIndexesResponse {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Deserialize)]
struct IndexModel {
    name: String,
    dimension: usize,
    #[serde(default)]
    metric: Metric,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: Option<IndexStatus>,
}

impl IndexModel {
    fn into_description(self) -> IndexDescription {
        IndexDescription {
            name: self.name,
            dimension: self.dimension,
            metric: self.metric,
            host: self.host.filter(|h| !h.is_empty()),
            ready: self.status.is_some_and(|s| s.ready),
        }
    }
}

#[derive(Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: Metric,
    spec: CreateIndexSpec<'a>,
}

#[derive(Serialize)]
struct CreateIndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    error: Option<ApiErrorBody>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> PineconeIndex {
        PineconeIndex::new(reqwest::Client::new(), "pc-test-key".into(), &server.uri())
    }

    fn index_json(name: &str, host: &str, ready: bool) -> serde_json::Value {
        let state = if ready { "Ready" } else { "Initializing" };
        json!({
            "name": name,
            "dimension": 384,
            "metric": "cosine",
            "host": host,
            "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } },
            "status": { "ready": ready, "state": state }
        })
    }

    fn spec() -> IndexSpec {
        IndexSpec {
            name: "medical-chatbot".into(),
            dimension: 384,
            metric: Metric::Cosine,
            cloud: "aws".into(),
            region: "us-east-1".into(),
        }
    }

    fn record(id: &str) -> VectorRecord {
        VectorRecord {
            id: id.into(),
            values: vec![0.1, 0.2],
            metadata: HashMap::from([("text".to_owned(), json!("hello"))]),
        }
    }

    #[test]
    fn data_plane_url_adds_scheme() {
        assert_eq!(
            data_plane_url("docs-abc.svc.pinecone.io"),
            "https://docs-abc.svc.pinecone.io"
        );
        assert_eq!(data_plane_url("http://127.0.0.1:9/"), "http://127.0.0.1:9");
    }

    #[test]
    fn error_message_reads_both_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"code":"ALREADY_EXISTS","message":"exists"},"status":409}"#),
            "exists"
        );
        assert_eq!(
            error_message(r#"{"code":3,"message":"bad dimension","details":[]}"#),
            "bad dimension"
        );
        assert_eq!(error_message("plain failure"), "plain failure");
    }

    #[test]
    fn debug_redacts_api_key() {
        let index = PineconeIndex::new(
            reqwest::Client::new(),
            "pc-secret".into(),
            "https://api.pinecone.io",
        );
        let debug = format!("{index:?}");
        assert!(!debug.contains("pc-secret"));
        assert!(debug.contains("api.pinecone.io"));
    }

    #[tokio::test]
    async fn list_indexes_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes"))
            .and(header("Api-Key", "pc-test-key"))
            .and(header("X-Pinecone-API-Version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "indexes": [index_json("medical-chatbot", "docs.svc.pinecone.io", true)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let list = client(&server).list_indexes().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "medical-chatbot");
        assert_eq!(list[0].dimension, 384);
        assert!(list[0].ready);
    }

    #[tokio::test]
    async fn list_indexes_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        assert!(client(&server).list_indexes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_indexes_unauthorized_is_list_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "code": "UNAUTHENTICATED", "message": "Invalid API Key" },
                "status": 401
            })))
            .mount(&server)
            .await;

        let err = client(&server).list_indexes().await.unwrap_err();
        assert!(matches!(err, VectorIndexError::List(msg) if msg.contains("Invalid API Key")));
    }

    #[tokio::test]
    async fn create_index_sends_serverless_spec() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .and(body_partial_json(json!({
                "name": "medical-chatbot",
                "dimension": 384,
                "metric": "cosine",
                "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } }
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(index_json("medical-chatbot", "", false)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let created = client(&server).create_index(&spec()).await.unwrap();
        assert_eq!(created.name, "medical-chatbot");
        assert!(!created.ready);
        assert!(created.host.is_none());
    }

    #[tokio::test]
    async fn create_conflict_is_create_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": { "code": "ALREADY_EXISTS", "message": "Resource already exists" },
                "status": 409
            })))
            .mount(&server)
            .await;

        let err = client(&server).create_index(&spec()).await.unwrap_err();
        assert!(matches!(err, VectorIndexError::Create(_)));
    }

    #[tokio::test]
    async fn upsert_resolves_host_and_posts_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/medical-chatbot"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(index_json(
                    "medical-chatbot",
                    &server.uri(),
                    true,
                )),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(header("Api-Key", "pc-test-key"))
            .and(body_partial_json(json!({ "namespace": "default" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": 2 })))
            .expect(2)
            .mount(&server)
            .await;

        let index = client(&server);
        let n = index
            .upsert("medical-chatbot", "default", vec![record("a"), record("b")])
            .await
            .unwrap();
        assert_eq!(n, 2);
        // Host is cached after the first lookup.
        index
            .upsert("medical-chatbot", "default", vec![record("c")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upsert_rejection_is_upsert_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "indexes": [index_json("medical-chatbot", &server.uri(), true)]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 3,
                "message": "Vector dimension 2 does not match the dimension of the index 384",
                "details": []
            })))
            .mount(&server)
            .await;

        let index = client(&server);
        index.list_indexes().await.unwrap();
        let err = index
            .upsert("medical-chatbot", "default", vec![record("a")])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorIndexError::Upsert(msg) if msg.contains("Vector dimension 2")));
    }

    #[tokio::test]
    async fn upsert_without_host_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/medical-chatbot"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(index_json("medical-chatbot", "", false)),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .upsert("medical-chatbot", "default", vec![record("a")])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorIndexError::Upsert(_)));
    }

    #[tokio::test]
    async fn empty_upsert_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let n = client(&server)
            .upsert("medical-chatbot", "default", Vec::new())
            .await
            .unwrap();
        assert_eq!(n, 0);
    }
}
