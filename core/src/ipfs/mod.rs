//! IPFS daemon HTTP API (`/api/v0`) as a pin source and unpin sink.

use crate::core::source::{PinSource, SourceError, Unpinner, parse_content_hash};
use crate::types::{ContentHash, PinnerConfig};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

/// Pin kinds the collector manages. Indirect pins are left out: they can only
/// be released by unpinning their recursive parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinType {
    Recursive,
    Direct,
}

impl PinType {
    pub const MANAGED: [PinType; 2] = [PinType::Recursive, PinType::Direct];

    pub fn as_str(self) -> &'static str {
        match self {
            PinType::Recursive => "recursive",
            PinType::Direct => "direct",
        }
    }
}

/// `pin/ls` response body. Only the key set is used.
#[derive(Debug, Deserialize)]
struct PinLsResponse {
    #[serde(rename = "Keys", default)]
    keys: Option<HashMap<String, serde_json::Value>>,
}

pub struct IpfsNode {
    base_url: String,
    agent: ureq::Agent,
}

impl IpfsNode {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();

        Self {
            base_url: base_url.into(),
            agent,
        }
    }

    pub fn from_config(config: &PinnerConfig) -> Self {
        Self::new(config.storage_node_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The daemon only accepts POST on `/api/v0`.
    fn post(&self, command: &str, query: &[(&str, &str)]) -> Result<String, SourceError> {
        let url = format!("{}/api/v0/{}", self.base_url, command);
        let mut request = self.agent.post(&url);
        for (name, value) in query {
            request = request.query(name, value);
        }

        let response = request.call()?;
        response
            .into_string()
            .map_err(|err| SourceError::Transport(err.to_string()))
    }

    pub fn list_pins(&self, pin_type: PinType) -> Result<HashSet<ContentHash>, SourceError> {
        let body = self.post("pin/ls", &[("type", pin_type.as_str())])?;
        let pins = parse_pin_ls(&body)?;
        debug!("{} {} pins on {}", pins.len(), pin_type.as_str(), self.base_url);
        Ok(pins)
    }
}

impl PinSource for IpfsNode {
    fn list_pinned_hashes(&self) -> Result<HashSet<ContentHash>, SourceError> {
        let mut pinned = HashSet::new();
        for pin_type in PinType::MANAGED {
            pinned.extend(self.list_pins(pin_type)?);
        }
        Ok(pinned)
    }
}

impl Unpinner for IpfsNode {
    fn unpin(&self, hash: &ContentHash) -> Result<(), SourceError> {
        self.post("pin/rm", &[("arg", hash.as_str()), ("recursive", "true")])?;
        Ok(())
    }
}

pub(crate) fn parse_pin_ls(body: &str) -> Result<HashSet<ContentHash>, SourceError> {
    let response: PinLsResponse = serde_json::from_str(body)?;

    response
        .keys
        .unwrap_or_default()
        .keys()
        .map(|key| parse_content_hash(key))
        .collect()
}
