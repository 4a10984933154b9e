//! Blocking JSON-RPC 2.0 client over HTTP, enough for eth_getLogs / eth_call.

use crate::core::source::SourceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    pub(crate) fn into_result(self) -> Result<Value, SourceError> {
        if let Some(error) = self.error {
            return Err(SourceError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result
            .ok_or_else(|| SourceError::Decode("response has neither result nor error".to_string()))
    }
}

pub struct JsonRpcClient {
    agent: ureq::Agent,
    rpc_url: String,
    request_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();

        Self {
            agent,
            rpc_url: rpc_url.into(),
            request_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn agent(&self) -> &ureq::Agent {
        &self.agent
    }

    pub fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, SourceError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
        };

        let body = serde_json::to_value(&request)?;
        let response: JsonRpcResponse = self
            .agent
            .post(&self.rpc_url)
            .send_json(body)?
            .into_json()
            .map_err(|err| SourceError::Decode(err.to_string()))?;

        response.into_result()
    }
}
