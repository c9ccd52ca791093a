use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    Client, RequestBuilder, Response,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{Connector, QueryResult, WarehouseClient};
use crate::{
    errors::DashError,
    models::connections::{ConnectionConfig, Credentials},
};

const LOGIN_PATH: &str = "/session/v1/login-request";
const QUERY_PATH: &str = "/queries/v1/query-request";
const LOGOUT_PATH: &str = "/session/logout-request";

const CLIENT_APP_ID: &str = "snowdash";
const USER_AGENT: &str = concat!("snowdash/", env!("CARGO_PKG_VERSION"));
const SNOWFLAKE_MEDIA_TYPE: &str = "application/snowflake";

/// Codes the service answers with while a statement is still running.
const QUERY_IN_PROGRESS: &str = "333333";
const QUERY_IN_PROGRESS_ASYNC: &str = "333334";
const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Serialize)]
struct LoginRequest<'a> {
    data: LoginData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LoginData<'a> {
    client_app_id: &'a str,
    client_app_version: &'a str,
    account_name: &'a str,
    login_name: &'a str,
    password: &'a str,
    session_parameters: SessionParameters,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct SessionParameters {
    query_result_format: &'static str,
}

#[derive(Deserialize)]
struct LoginResponseData {
    token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    sql_text: &'a str,
    async_exec: bool,
    sequence_id: u64,
    query_submission_time: i64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct QueryResponseData {
    #[serde(default)]
    rowtype: Vec<RowType>,
    #[serde(default)]
    rowset: Vec<Vec<Value>>,
    #[serde(default)]
    chunks: Vec<ChunkInfo>,
    #[serde(default)]
    chunk_headers: HashMap<String, String>,
    qrmk: Option<String>,
    query_result_format: Option<String>,
    get_result_url: Option<String>,
    query_id: Option<String>,
}

#[derive(Deserialize)]
struct RowType {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkInfo {
    url: String,
    row_count: Option<usize>,
}

/// Response wrapper shared by every session endpoint.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    success: bool,
}

impl<T> Envelope<T> {
    fn in_progress(&self) -> bool {
        matches!(
            self.code.as_deref(),
            Some(QUERY_IN_PROGRESS) | Some(QUERY_IN_PROGRESS_ASYNC)
        )
    }

    fn failure_message(&self) -> String {
        match (&self.message, &self.code) {
            (Some(message), _) => message.clone(),
            (None, Some(code)) => format!("Request failed with code {}", code),
            (None, None) => "Request failed without a message".to_string(),
        }
    }
}

/// Logs in to one account over the Snowflake session protocol.
pub struct SnowflakeConnector {
    http: Client,
    config: ConnectionConfig,
}

impl SnowflakeConnector {
    pub fn new(config: ConnectionConfig) -> Result<Self, DashError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DashError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: ConnectionConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }
}

#[async_trait]
impl Connector for SnowflakeConnector {
    async fn connect(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn WarehouseClient>, DashError> {
        info!(
            "logging in to account {} as {}",
            self.config.account, credentials.username
        );

        let body = LoginRequest {
            data: LoginData {
                client_app_id: CLIENT_APP_ID,
                client_app_version: env!("CARGO_PKG_VERSION"),
                account_name: &self.config.account,
                login_name: &credentials.username,
                password: credentials.password.expose_secret(),
                session_parameters: SessionParameters {
                    query_result_format: "JSON",
                },
            },
        };

        let mut params = vec![("requestId", Uuid::new_v4().to_string())];
        if let Some(role) = &self.config.role {
            params.push(("roleName", role.clone()));
        }

        let response = self
            .http
            .post(format!("{}{}", self.config.base_url, LOGIN_PATH))
            .query(&params)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DashError::Auth(format!("Failed to reach {}: {}", self.config.base_url, e)))?;

        let envelope: Envelope<LoginResponseData> = decode(response)
            .await
            .map_err(|e| DashError::Auth(e.to_string()))?;

        if !envelope.success {
            let message = envelope.failure_message();
            warn!("login rejected: {}", message);
            return Err(DashError::Auth(message));
        }

        let token = envelope
            .data
            .and_then(|data| data.token)
            .ok_or_else(|| {
                DashError::Auth("Login response did not include a session token".to_string())
            })?;

        info!("logged in as {}", credentials.username);

        Ok(Box::new(SnowflakeClient {
            http: self.http.clone(),
            base_url: self.config.base_url.clone(),
            token: SecretString::from(token),
            sequence: AtomicU64::new(0),
        }))
    }
}

/// One authenticated session.
pub struct SnowflakeClient {
    http: Client,
    base_url: String,
    token: SecretString,
    sequence: AtomicU64,
}

impl SnowflakeClient {
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            AUTHORIZATION,
            format!("Snowflake Token=\"{}\"", self.token.expose_secret()),
        )
    }

    async fn collect(&self, data: QueryResponseData) -> Result<QueryResult, DashError> {
        if let Some(format) = data.query_result_format.as_deref() {
            if !format.eq_ignore_ascii_case("json") {
                return Err(DashError::Query(format!(
                    "Unsupported result format '{}'",
                    format
                )));
            }
        }

        let columns = data.rowtype.into_iter().map(|column| column.name).collect();
        let mut rows = cells(data.rowset);

        let mut headers = data.chunk_headers;
        if headers.is_empty() {
            if let Some(qrmk) = data.qrmk {
                headers.insert(
                    "x-amz-server-side-encryption-customer-algorithm".to_string(),
                    "AES256".to_string(),
                );
                headers.insert(
                    "x-amz-server-side-encryption-customer-key".to_string(),
                    qrmk,
                );
            }
        }

        for chunk in &data.chunks {
            rows.extend(self.fetch_chunk(chunk, &headers).await?);
        }

        Ok(QueryResult { columns, rows })
    }

    async fn fetch_chunk(
        &self,
        chunk: &ChunkInfo,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<Vec<Option<String>>>, DashError> {
        debug!("downloading result chunk ({:?} rows)", chunk.row_count);

        let mut request = self.http.get(&chunk.url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashError::Query(format!(
                "Failed to download result chunk: HTTP {}",
                status
            )));
        }

        // Chunks are a comma-separated list of row arrays without the outer brackets.
        let body = response.text().await.map_err(transport)?;
        let rows: Vec<Vec<Value>> = serde_json::from_str(&format!("[{}]", body))
            .map_err(|e| DashError::Query(format!("Malformed result chunk: {}", e)))?;

        Ok(cells(rows))
    }
}

#[async_trait]
impl WarehouseClient for SnowflakeClient {
    async fn execute(&self, statement: &str) -> Result<QueryResult, DashError> {
        let sequence_id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("[{}] {}", sequence_id, statement);

        let body = QueryRequest {
            sql_text: statement,
            async_exec: false,
            sequence_id,
            query_submission_time: Utc::now().timestamp_millis(),
        };

        let response = self
            .authorized(self.http.post(self.url(QUERY_PATH)))
            .query(&[("requestId", Uuid::new_v4().to_string())])
            .header(ACCEPT, SNOWFLAKE_MEDIA_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let mut envelope: Envelope<QueryResponseData> = decode(response).await?;

        while envelope.in_progress() {
            let result_url = envelope
                .data
                .as_ref()
                .and_then(|data| data.get_result_url.clone())
                .ok_or_else(|| {
                    DashError::Query("Statement is still running but has no result URL".to_string())
                })?;
            debug!("[{}] still running, polling {}", sequence_id, result_url);
            tokio::time::sleep(POLL_INTERVAL).await;

            let response = self
                .authorized(self.http.get(self.url(&result_url)))
                .header(ACCEPT, SNOWFLAKE_MEDIA_TYPE)
                .send()
                .await
                .map_err(transport)?;
            envelope = decode(response).await?;
        }

        if !envelope.success {
            let message = envelope.failure_message();
            warn!("[{}] failed: {}", sequence_id, message);
            return Err(DashError::Query(message));
        }

        let data = envelope.data.unwrap_or_default();
        if let Some(query_id) = &data.query_id {
            debug!("[{}] query id {}", sequence_id, query_id);
        }
        self.collect(data).await
    }

    async fn close(&self) -> Result<(), DashError> {
        let response = self
            .authorized(self.http.post(self.url(LOGOUT_PATH)))
            .query(&[("requestId", Uuid::new_v4().to_string())])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;
        let envelope: Envelope<Value> = decode(response).await?;

        if !envelope.success {
            return Err(DashError::Query(envelope.failure_message()));
        }

        info!("session closed");
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, DashError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(DashError::Query(format!("HTTP {}: {}", status, body.trim())));
    }

    response
        .json::<Envelope<T>>()
        .await
        .map_err(|e| DashError::Query(format!("Malformed response: {}", e)))
}

fn transport(e: reqwest::Error) -> DashError {
    DashError::Query(e.to_string())
}

fn cells(rows: Vec<Vec<Value>>) -> Vec<Vec<Option<String>>> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| match value {
                    Value::Null => None,
                    Value::String(text) => Some(text),
                    other => Some(other.to_string()),
                })
                .collect()
        })
        .collect()
}
