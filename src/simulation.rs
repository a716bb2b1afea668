use crate::device::DeviceRecord;
use once_cell::sync::Lazy;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{info, warn};

/// First host suffix handed out in every subnet
const FIRST_HOST_SUFFIX: u32 = 10;

/// A simulated subnet and how many devices of each kind it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub subnet_prefix: String,
    pub pc: u32,
    pub laptop: u32,
    pub printer: u32,
}

impl NetworkConfig {
    pub fn new(subnet_prefix: &str, pc: u32, laptop: u32, printer: u32) -> Self {
        Self {
            subnet_prefix: subnet_prefix.to_string(),
            pc,
            laptop,
            printer,
        }
    }

    // Device groups in the order their addresses are assigned
    fn device_groups(&self) -> [(&'static str, u32); 3] {
        [("PC", self.pc), ("Laptop", self.laptop), ("Printer", self.printer)]
    }
}

static DEFAULT_NETWORKS: Lazy<Vec<NetworkConfig>> = Lazy::new(|| {
    vec![
        NetworkConfig::new("192.168.1", 3, 1, 1),
        NetworkConfig::new("192.168.2", 3, 1, 1),
    ]
});

/// Configuration for the simulation driver
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Log service endpoint
    pub server_url: String,
    /// Per-request timeout; a timeout counts as a transport failure
    pub request_timeout: Duration,
    pub networks: Vec<NetworkConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080/".to_string(),
            request_timeout: Duration::from_secs(5),
            networks: DEFAULT_NETWORKS.clone(),
        }
    }
}

/// Routing mode follows the parity of the host suffix
pub fn routing_for_suffix(suffix: u32) -> &'static str {
    if suffix % 2 == 0 {
        "Dynamic"
    } else {
        "Static"
    }
}

/// Build every synthetic record, in posting order.
///
/// Subnets are numbered from 1. Within a subnet, suffixes start at
/// `FIRST_HOST_SUFFIX` and run across all groups; device indices restart at 1
/// for each group.
pub fn build_records(networks: &[NetworkConfig]) -> Vec<DeviceRecord> {
    let mut records = Vec::new();

    for (net_idx, network) in networks.iter().enumerate() {
        let subnet_number = net_idx + 1;
        let mut suffix = FIRST_HOST_SUFFIX;

        for (device_type, count) in network.device_groups() {
            for i in 1..=count {
                records.push(DeviceRecord::new(
                    format!("{}{}_{}", device_type, i, subnet_number),
                    device_type,
                    format!("{}.{}", network.subnet_prefix, suffix),
                    routing_for_suffix(suffix),
                ));
                suffix += 1;
            }
        }
    }

    records
}

/// How a single post ended
#[derive(Debug)]
pub enum SendOutcome {
    /// 200 from the service, with its response body
    Accepted(String),
    /// Any other status from the service
    Rejected(StatusCode),
    /// The record could not be encoded
    EncodeFailed(serde_json::Error),
    /// Connection error or timeout
    TransportFailed(reqwest::Error),
}

impl SendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SendOutcome::Accepted(_))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimulationReport {
    pub succeeded: usize,
    pub failed: usize,
}

pub struct SimulationClient {
    client: reqwest::Client,
    server_url: String,
}

impl SimulationClient {
    pub fn new(server_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            server_url: server_url.into(),
        })
    }

    pub async fn send(&self, record: &DeviceRecord) -> SendOutcome {
        let body = match serde_json::to_vec(record) {
            Ok(b) => b,
            Err(e) => return SendOutcome::EncodeFailed(e),
        };

        let response = match self
            .client
            .post(&self.server_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return SendOutcome::TransportFailed(e),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return SendOutcome::Rejected(status);
        }

        // A body that fails to arrive still counts as accepted
        let text = response.text().await.unwrap_or_default();
        SendOutcome::Accepted(text)
    }
}

fn report_outcome(record: &DeviceRecord, outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Accepted(body) => println!(
            "[SUCCESS] Sent {} ({}): server replied: {}",
            record.device_name, record.ip_address, body
        ),
        SendOutcome::Rejected(status) => println!(
            "[FAILURE] Sent {} ({}): server returned {}",
            record.device_name,
            record.ip_address,
            status.as_u16()
        ),
        SendOutcome::EncodeFailed(e) => {
            warn!("JSON encoding error for {}: {}", record.device_name, e)
        }
        SendOutcome::TransportFailed(e) => {
            warn!("Error sending POST for {}: {}", record.device_name, e)
        }
    }
}

/// Post every simulated record, one at a time. Failures are reported and
/// skipped; nothing is retried.
pub async fn run_simulation(config: &SimulationConfig) -> anyhow::Result<SimulationReport> {
    let client = SimulationClient::new(config.server_url.clone(), config.request_timeout)?;
    let records = build_records(&config.networks);

    info!(
        "Starting network simulation: {} devices across {} subnets",
        records.len(),
        config.networks.len()
    );

    let mut report = SimulationReport::default();
    for record in &records {
        let outcome = client.send(record).await;
        report_outcome(record, &outcome);
        if outcome.is_success() {
            report.succeeded += 1;
        } else {
            report.failed += 1;
        }
    }

    info!(
        "Simulation finished: {} succeeded, {} failed",
        report.succeeded, report.failed
    );
    Ok(report)
}
