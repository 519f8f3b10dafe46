/// PostgREST data client: reads and writes rows through the hosted data API.
///
/// One request per call, no retries: a failed call surfaces as a screen-level
/// error and the user re-triggers the action.
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::query::{scalar_to_param, Filter, Query, Table};
use super::{DataClient, DataError, Row};
use crate::auth::Session;

const REST_PATH: &str = "/rest/v1";
const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Clone)]
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: String,
    /// Anon key for public reads, or the user's access token.
    bearer: String,
}

impl PostgrestClient {
    pub fn new(client: Client, supabase_url: &str, api_key: String) -> Self {
        Self {
            client,
            base_url: format!("{}{}", supabase_url.trim_end_matches('/'), REST_PATH),
            bearer: api_key.clone(),
            api_key,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, DataError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<PostgrestError>(&body)
            .map(|e| match e.details {
                Some(details) => format!("{} ({details})", e.message),
                None => e.message,
            })
            .unwrap_or(body);
        warn!("Data API returned {}: {}", status, message);

        Err(DataError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn rows(&self, response: Response) -> Result<Vec<Row>, DataError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let value: Value = serde_json::from_str(&text)?;
        Ok(match value {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            single => vec![single],
        })
    }
}

#[async_trait]
impl DataClient for PostgrestClient {
    async fn fetch_rows(&self, table: Table, query: Query) -> Result<Vec<Row>, DataError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query_pairs(&query));

        let response = self
            .send(self.request(Method::GET, table.as_str()).query(&params))
            .await?;
        let rows = self.rows(response).await?;
        debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    async fn insert_row(&self, table: Table, fields: Value) -> Result<Row, DataError> {
        let response = self
            .send(
                self.request(Method::POST, table.as_str())
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(&fields),
            )
            .await?;
        self.rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(DataError::NotFound { table })
    }

    async fn insert_rows(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Row>, DataError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .send(
                self.request(Method::POST, table.as_str())
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(&rows),
            )
            .await?;
        self.rows(response).await
    }

    async fn update_row(&self, table: Table, id: Uuid, fields: Value) -> Result<Row, DataError> {
        let response = self
            .send(
                self.request(Method::PATCH, table.as_str())
                    .query(&[("id", format!("eq.{id}"))])
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(&fields),
            )
            .await?;
        self.rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(DataError::NotFound { table })
    }

    async fn upsert_row(&self, table: Table, fields: Value) -> Result<Row, DataError> {
        let response = self
            .send(
                self.request(Method::POST, table.as_str())
                    .header("Prefer", MERGE_DUPLICATES)
                    .json(&fields),
            )
            .await?;
        self.rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(DataError::NotFound { table })
    }

    async fn delete_row(&self, table: Table, id: Uuid) -> Result<(), DataError> {
        self.send(
            self.request(Method::DELETE, table.as_str())
                .query(&[("id", format!("eq.{id}"))]),
        )
        .await?;
        Ok(())
    }

    async fn delete_where(&self, table: Table, filters: Vec<Filter>) -> Result<(), DataError> {
        let query = Query {
            filters,
            ..Query::default()
        };
        self.send(self.request(Method::DELETE, table.as_str()).query(&query_pairs(&query)))
            .await?;
        Ok(())
    }

    async fn invoke_procedure(&self, name: &str, args: Value) -> Result<Vec<Row>, DataError> {
        let response = self
            .send(self.request(Method::POST, &format!("rpc/{name}")).json(&args))
            .await?;
        self.rows(response).await
    }

    fn for_session(&self, session: &Session) -> Arc<dyn DataClient> {
        let mut scoped = self.clone();
        scoped.bearer = session.access_token.clone();
        Arc::new(scoped)
    }
}

/// Encodes filters, ordering and limit as PostgREST query parameters.
fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = query
        .filters
        .iter()
        .map(|filter| {
            let operand = match filter {
                Filter::Eq(_, Value::Null) => "is.null".to_string(),
                Filter::Eq(_, value) => format!("eq.{}", scalar_to_param(value)),
                Filter::ILike(_, needle) => format!("ilike.*{needle}*"),
                Filter::In(_, values) => {
                    let list = values
                        .iter()
                        .map(|v| match v {
                            Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
                            other => scalar_to_param(other),
                        })
                        .collect::<Vec<_>>()
                        .join(",");
                    format!("in.({list})")
                }
            };
            (filter.column().to_string(), operand)
        })
        .collect();

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("order".to_string(), order));
    }

    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }

    pairs
}
