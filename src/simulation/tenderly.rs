//! Tenderly simulate-bundle client

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use crate::{
    config::SimulatorSettings,
    errors::BotResult,
    network::providers::http_client,
    simulation::{BundleSimulator, SimulationError, decode_output, hex_field, revert_reason},
    types::{DecodedOutput, SimulationCall, SimulationResult},
};

#[derive(Deserialize)]
#[serde(untagged)]
enum BundleResponse {
    Wrapped { simulation_results: Vec<Value> },
    Bare(Vec<Value>),
}

impl BundleResponse {
    fn into_entries(self) -> Vec<Value> {
        match self {
            BundleResponse::Wrapped { simulation_results } => simulation_results,
            BundleResponse::Bare(entries) => entries,
        }
    }
}

pub struct TenderlyClient {
    client: reqwest::Client,
    url: String,
    access_key: String,
    network_id: String,
    timeout_secs: u64,
}

impl TenderlyClient {
    pub fn new(settings: &SimulatorSettings) -> BotResult<Self> {
        Ok(Self {
            client: http_client(Duration::from_secs(settings.timeout_secs))?,
            url: settings.bundle_url(),
            access_key: settings.access_key.clone(),
            network_id: settings.network_id.to_string(),
            timeout_secs: settings.timeout_secs,
        })
    }

    fn request_body(&self, calls: &[SimulationCall]) -> Value {
        let simulations: Vec<Value> = calls
            .iter()
            .map(|call| {
                json!({
                    "network_id": self.network_id,
                    "from": call.tx.from,
                    "to": call.tx.to,
                    "input": call.tx.input,
                    "gas": call.tx.gas,
                    "value": call.tx.value.to_string(),
                    "save": true,
                    "save_if_fails": true,
                    "simulation_type": "quick",
                })
            })
            .collect();
        json!({ "simulations": simulations })
    }

    fn transport_error(&self, e: reqwest::Error) -> SimulationError {
        if e.is_timeout() {
            SimulationError::Timeout(self.timeout_secs)
        } else {
            SimulationError::Transport(e)
        }
    }
}

/// Turns raw simulator entries into results, marking every entry after the
/// first revert as unreliable.
pub fn interpret_entries(calls: &[SimulationCall], entries: Vec<Value>) -> Result<Vec<SimulationResult>, SimulationError> {
    if entries.len() != calls.len() {
        return Err(SimulationError::CountMismatch {
            expected: calls.len(),
            got: entries.len(),
        });
    }

    let mut seen_revert = false;
    let mut results = Vec::with_capacity(calls.len());

    for (call, entry) in calls.iter().zip(entries) {
        if !entry.is_object() {
            return Err(SimulationError::Malformed(format!(
                "entry for {} is not an object",
                call.tx.label
            )));
        }

        let status = entry
            .pointer("/transaction/status")
            .or_else(|| entry.pointer("/simulation/status"))
            .and_then(Value::as_bool);
        let has_error = entry.pointer("/error").is_some_and(|e| !e.is_null());
        let reverted = status == Some(false) || (status.is_none() && has_error);

        let output = hex_field(entry.pointer("/transaction/transaction_info/call_trace/output"));
        let (decoded_output, reason) = if reverted {
            (DecodedOutput::Unknown, revert_reason(&entry, output.as_ref()))
        } else if status.is_none() {
            (DecodedOutput::Unknown, None)
        } else {
            let data = output.clone().unwrap_or_default();
            (decode_output(call.decode, &data), None)
        };

        if reverted {
            warn!(
                label = %call.tx.label,
                reason = reason.as_deref().unwrap_or("unknown"),
                "Simulated transaction reverted"
            );
        }

        results.push(SimulationResult {
            label: call.tx.label.clone(),
            reverted,
            revert_reason: reason,
            decoded_output,
            raw_output: output,
            raw_trace: entry,
            unreliable: seen_revert,
        });
        seen_revert |= reverted;
    }

    Ok(results)
}

#[async_trait]
impl BundleSimulator for TenderlyClient {
    async fn simulate(&self, calls: &[SimulationCall]) -> Result<Vec<SimulationResult>, SimulationError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        debug!(transactions = calls.len(), "Submitting simulation bundle");

        let response = self
            .client
            .post(&self.url)
            .header("X-Access-Key", &self.access_key)
            .json(&self.request_body(calls))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(SimulationError::Server {
                status: status.as_u16(),
                body: body.chars().take(512).collect(),
            });
        }

        let parsed: BundleResponse = serde_json::from_str(&body)
            .map_err(|e| SimulationError::Malformed(e.to_string()))?;

        interpret_entries(calls, parsed.into_entries())
    }
}
