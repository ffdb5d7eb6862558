//! Probe execution: one HTTP request or one resolver call per action.

use std::sync::Arc;

use dashprobe_api::{CSRF_HEADER_NAME, ClientError, ConsoleClient};
use dashprobe_resolver::{DatasourceResolver, ResolutionError};
use dashprobe_types::HttpMethod;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::ProbeTicket;

/// Failure of a single probe. The console renders every variant the same
/// way: as its description in the response field.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {status}")]
    Status { status: StatusCode },

    #[error("Invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Snapshot of the parameters of a raw probe, taken when the probe starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProbeRequest {
    pub endpoint: String,
    pub method: HttpMethod,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeAction {
    Raw(RawProbeRequest),
    Resolve { datasource_name: String },
}

/// A probe that has been issued a ticket but not yet run.
///
/// It owns everything it needs, so it can be awaited in place or spawned
/// onto the runtime while the operator keeps editing.
pub struct PendingProbe {
    pub ticket: ProbeTicket,
    pub action: ProbeAction,
    client: ConsoleClient,
    resolver: Arc<DatasourceResolver>,
}

/// Outcome of a finished probe, tagged with the ticket it was issued under.
#[derive(Debug)]
pub struct ProbeCompletion {
    pub ticket: ProbeTicket,
    pub outcome: Result<String, ProbeError>,
}

impl PendingProbe {
    pub(crate) fn new(ticket: ProbeTicket, action: ProbeAction, client: ConsoleClient, resolver: Arc<DatasourceResolver>) -> Self {
        Self {
            ticket,
            action,
            client,
            resolver,
        }
    }

    pub async fn run(self) -> ProbeCompletion {
        let outcome = match &self.action {
            ProbeAction::Raw(request) => send_raw_probe(&self.client, request).await,
            ProbeAction::Resolve { datasource_name } => send_resolver_probe(&self.resolver, datasource_name).await,
        };
        ProbeCompletion {
            ticket: self.ticket,
            outcome,
        }
    }
}

/// Issue exactly one HTTP request and pretty-print its JSON response.
///
/// - GET carries no body and no anti-forgery header.
/// - POST sends the body field serialized as JSON and an `X-CSRFToken`
///   header holding the `csrf-token` cookie as it is at call time.
/// - Any non-success status fails the probe, whatever the body holds.
pub async fn send_raw_probe(client: &ConsoleClient, request: &RawProbeRequest) -> Result<String, ProbeError> {
    let mut builder = client.request(to_reqwest_method(request.method), &request.endpoint)?;

    if request.method.is_mutating() {
        let csrf_token = client.cookies().csrf_token().unwrap_or_else(|| {
            warn!("no csrf-token cookie configured; sending an empty {CSRF_HEADER_NAME} header");
            String::new()
        });
        builder = builder.header(CSRF_HEADER_NAME, csrf_token).json(&request.body);
    }

    let response = builder.send().await?;
    let status = response.status();
    debug!(endpoint = %request.endpoint, method = %request.method, %status, "probe response received");

    if !status.is_success() {
        return Err(ProbeError::Status { status });
    }

    let text = response.text().await?;
    let payload: Value = serde_json::from_str(&text)?;
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Resolve a datasource name and pretty-print the descriptor.
pub async fn send_resolver_probe(resolver: &DatasourceResolver, datasource_name: &str) -> Result<String, ProbeError> {
    let descriptor = resolver.resolve(datasource_name).await?;
    Ok(serde_json::to_string_pretty(&descriptor)?)
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
    }
}
