//! HTTP client for the hosted backend: a PostgREST-style table API under
//! `/rest/v1` and an object storage API under `/storage/v1`.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use super::{BlobStore, OrderBy, Row, TableStore};
use crate::error::StoreError;
use crate::models::RecordId;

/// Asks the table API to merge on primary key and echo the stored row.
const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=representation";

pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("avian-journal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, key)
    }

    /// Attach credentials, send, and turn non-2xx answers into errors.
    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        reject_failures(response).await
    }

    async fn rows(&self, request: RequestBuilder) -> Result<Vec<Row>, StoreError> {
        let body = self.send(request).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Pull the most helpful message out of an error response. Both APIs send a
/// JSON object with `message`; fall back to the raw body or the status text.
async fn reject_failures(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                trimmed.to_string()
            }
        });

    warn!("Backend rejected request with {status}: {message}");
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TableStore for RestStore {
    async fn select_all(&self, table: &str, order: OrderBy) -> Result<Vec<Row>, StoreError> {
        let direction = if order.descending { "desc" } else { "asc" };
        let order = format!("{}.{}", order.column, direction);
        debug!("GET {table} order={order}");

        let request = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*"), ("order", order.as_str())]);
        self.rows(request).await
    }

    async fn select_one(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Row, StoreError> {
        debug!("GET {table} where {column}={value}");
        let filter = format!("eq.{value}");
        // Two rows are enough to tell "one" from "several".
        let request = self.client.get(self.table_url(table)).query(&[
            ("select", "*"),
            (column, filter.as_str()),
            ("limit", "2"),
        ]);

        let mut rows = self.rows(request).await?;
        match rows.len() {
            0 => Err(StoreError::NotFound {
                table: table.to_string(),
            }),
            1 => Ok(rows.remove(0)),
            _ => Err(StoreError::MultipleRows {
                table: table.to_string(),
            }),
        }
    }

    async fn upsert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        debug!("POST {table} (upsert)");
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", UPSERT_PREFERENCE)
            .json(&row);

        let stored = self.rows(request).await?;
        Ok(stored.into_iter().next().unwrap_or(row))
    }

    async fn delete(&self, table: &str, id: &RecordId) -> Result<(), StoreError> {
        debug!("DELETE {table} id={id}");
        let filter = format!("eq.{id}");
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", filter.as_str())]);
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for RestStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        debug!("Uploading {} bytes to {bucket}/{key}", bytes.len());
        let request = self
            .client
            .post(self.object_url(bucket, key))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        self.send(request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, key
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_bytes, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn store_for(server: &MockServer) -> RestStore {
        RestStore::new(&server.uri(), "anon-key", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn select_all_sends_order_and_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/birds"))
            .and(query_param("select", "*"))
            .and(query_param("order", "created_at.desc"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 2, "english_name": "Scarlet Macaw" },
                { "id": 1, "english_name": "Bald Eagle" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = store_for(&server)
            .select_all("birds", OrderBy::descending("created_at"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["english_name"], "Scarlet Macaw");
    }

    #[tokio::test]
    async fn select_one_reports_not_found_for_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/birds"))
            .and(query_param("slug", "eq.dodo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .select_one("birds", "slug", "dodo")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn select_one_rejects_duplicate_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/events"))
            .and(query_param("limit", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }, { "id": 2 }])),
            )
            .mount(&server)
            .await;

        let err = store_for(&server)
            .select_one("events", "slug", "dawn-walk")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MultipleRows { .. }));
    }

    #[tokio::test]
    async fn upsert_asks_for_merge_and_returns_stored_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/birds"))
            .and(header("Prefer", UPSERT_PREFERENCE))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                { "id": "7", "english_name": "Snowy Owl", "slug": "snowy-owl" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let stored = store_for(&server)
            .upsert("birds", json!({ "english_name": "Snowy Owl", "slug": "snowy-owl" }))
            .await
            .unwrap();
        assert_eq!(stored["id"], "7");
    }

    #[tokio::test]
    async fn rejection_surfaces_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/birds"))
            .and(query_param("id", "eq.9"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "permission denied for table birds"
            })))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .delete("birds", &RecordId::new("9"))
            .await
            .unwrap_err();
        match err {
            StoreError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "permission denied for table birds");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_posts_bytes_and_builds_public_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/birds/abc-1.jpg"))
            .and(header("Content-Type", "image/jpeg"))
            .and(body_bytes(vec![1u8, 2, 3]))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "birds/abc-1.jpg" })))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        store
            .upload("birds", "abc-1.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();
        assert_eq!(
            store.public_url("birds", "abc-1.jpg"),
            format!("{}/storage/v1/object/public/birds/abc-1.jpg", server.uri())
        );
    }
}
