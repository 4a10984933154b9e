//! Listings registry on an Ethereum-compatible chain.
//!
//! Every listing is announced by an event on the registry contract. The
//! event carries the listing's registry index; the registry maps the index
//! to the listing contract, and the listing contract stores the sha2-256
//! digest of its content, which is turned back into a CIDv0.

use crate::core::source::{OriginSource, SourceError, parse_content_hash};
use crate::types::{ContentHash, EtherscanConfig, PinnerConfig, RegistryConfig};
use abi::Word;
use rpc::JsonRpcClient;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

pub mod abi;
pub mod rpc;

/// A log entry as returned by `eth_getLogs` and the Etherscan logs API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLog {
    pub data: String,
}

/// Etherscan replies with `status: "0"` both for real errors and for an
/// empty result set.
#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    message: String,
    result: Value,
}

const ETHERSCAN_NO_RECORDS: &str = "No records found";

/// Largest page the Etherscan logs API returns.
pub const ETHERSCAN_PAGE_SIZE: usize = 1000;

enum LogSource {
    JsonRpc,
    Etherscan(EtherscanConfig),
}

pub struct EthRegistry {
    rpc: JsonRpcClient,
    logs: LogSource,
    registry_address: String,
    event_topic: String,
    listing_address_selector: [u8; 4],
    listing_hash_selector: [u8; 4],
}

impl EthRegistry {
    pub fn new(config: &RegistryConfig, timeout: Duration) -> Self {
        let logs = match &config.etherscan {
            Some(etherscan) => LogSource::Etherscan(etherscan.clone()),
            None => LogSource::JsonRpc,
        };

        Self {
            rpc: JsonRpcClient::new(config.provider_url.clone(), timeout),
            logs,
            registry_address: config.registry_address.to_lowercase(),
            event_topic: abi::event_topic(&config.event_signature),
            listing_address_selector: abi::selector(&config.listing_address_method),
            listing_hash_selector: abi::selector(&config.listing_hash_method),
        }
    }

    pub fn from_config(config: &PinnerConfig) -> Self {
        Self::new(&config.registry, config.request_timeout())
    }

    /// All listing events ever emitted by the registry.
    pub fn fetch_listing_logs(&self) -> Result<Vec<RawLog>, SourceError> {
        match &self.logs {
            LogSource::JsonRpc => {
                info!("fetching listing events from the JSON-RPC provider");
                let filter = json!({
                    "fromBlock": "0x0",
                    "toBlock": "latest",
                    "address": self.registry_address,
                    "topics": [self.event_topic],
                });
                let result = self.rpc.call("eth_getLogs", vec![filter])?;
                Ok(serde_json::from_value(result)?)
            }
            LogSource::Etherscan(etherscan) => {
                info!("fetching listing events from Etherscan");
                let mut logs = Vec::new();
                for page in 1u32.. {
                    let batch = self.fetch_etherscan_page(etherscan, page)?;
                    debug!("Etherscan page {} has {} events", page, batch.len());
                    let last_page = batch.len() < ETHERSCAN_PAGE_SIZE;
                    logs.extend(batch);
                    if last_page {
                        break;
                    }
                }
                Ok(logs)
            }
        }
    }

    /// One page of listing events. A page shorter than
    /// [`ETHERSCAN_PAGE_SIZE`] is the last one.
    fn fetch_etherscan_page(
        &self,
        etherscan: &EtherscanConfig,
        page: u32,
    ) -> Result<Vec<RawLog>, SourceError> {
        let response: EtherscanResponse = self
            .rpc
            .agent()
            .get(&etherscan.api_url)
            .query("module", "logs")
            .query("action", "getLogs")
            .query("fromBlock", "0")
            .query("toBlock", "latest")
            .query("address", &self.registry_address)
            .query("topic0", &self.event_topic)
            .query("page", &page.to_string())
            .query("offset", &ETHERSCAN_PAGE_SIZE.to_string())
            .query("apikey", &etherscan.api_key)
            .call()?
            .into_json()
            .map_err(|err| SourceError::Decode(err.to_string()))?;
        parse_etherscan_logs(response)
    }

    /// Content hash of the listing announced by `log`.
    pub fn listing_hash(&self, log: &RawLog) -> Result<ContentHash, SourceError> {
        let data = abi::decode_hex(&log.data)?;
        let index = abi::word(&data, 0)?;

        let address_word =
            self.eth_call_word(&self.registry_address, self.listing_address_selector, &[index])?;
        let listing_address = abi::address_from_word(&address_word)?;
        if listing_address == [0u8; 20] {
            return Err(SourceError::Decode(format!(
                "registry has no listing at index {}",
                abi::encode_hex(&index)
            )));
        }
        let listing_address = abi::encode_hex(&listing_address);
        debug!(
            "listing {} is at {}",
            abi::encode_hex(&index),
            listing_address
        );

        let digest = self.eth_call_word(&listing_address, self.listing_hash_selector, &[])?;
        parse_content_hash(&abi::cid_v0_from_digest(&digest))
    }

    fn eth_call_word(
        &self,
        to: &str,
        selector: [u8; 4],
        args: &[Word],
    ) -> Result<Word, SourceError> {
        let call = json!({ "to": to, "data": abi::call_data(selector, args) });
        let result = self.rpc.call("eth_call", vec![call, json!("latest")])?;
        let hex = result
            .as_str()
            .ok_or_else(|| SourceError::Decode(format!("eth_call returned {}", result)))?;
        abi::word(&abi::decode_hex(hex)?, 0)
    }
}

impl OriginSource for EthRegistry {
    fn list_origin_hashes(&self) -> Result<HashSet<ContentHash>, SourceError> {
        let logs = self.fetch_listing_logs()?;
        debug!("received {} listing events", logs.len());

        logs.iter().map(|log| self.listing_hash(log)).collect()
    }
}

fn parse_etherscan_logs(response: EtherscanResponse) -> Result<Vec<RawLog>, SourceError> {
    if response.status == "1" {
        return Ok(serde_json::from_value(response.result)?);
    }

    if response.message == ETHERSCAN_NO_RECORDS {
        return Ok(Vec::new());
    }

    Err(SourceError::Rpc {
        code: 0,
        message: format!("{}: {}", response.message, response.result),
    })
}
