//! Interactive probe console for the dashboards plugin backend.
//!
//! The console keeps editable request parameters in a
//! [`ProbeRequestState`] and, on each operator action, performs exactly one
//! probe:
//!
//! - a raw probe ([`ProbeConsole::fetch_endpoint`]) that sends one HTTP
//!   request to the entered endpoint, or
//! - a resolver probe ([`ProbeConsole::fetch_datasource`]) that resolves the
//!   entered datasource name.
//!
//! Both write their outcome, pretty-printed JSON or an error description, to
//! the single response field. Probes may overlap when they are started with
//! [`ProbeConsole::begin_raw_probe`] / [`ProbeConsole::begin_resolver_probe`]
//! and spawned; only the most recently issued probe may update the field.

mod probe;
mod state;

pub use probe::{PendingProbe, ProbeAction, ProbeCompletion, ProbeError, RawProbeRequest, send_raw_probe, send_resolver_probe};
pub use state::{DEFAULT_DATASOURCE_NAME, DEFAULT_PROXY_URL, ProbeRequestState, ProbeTicket};

use std::sync::Arc;

use dashprobe_api::ConsoleClient;
use dashprobe_resolver::DatasourceResolver;
use tracing::{debug, error};

pub struct ProbeConsole {
    client: ConsoleClient,
    resolver: Arc<DatasourceResolver>,
    state: ProbeRequestState,
}

impl ProbeConsole {
    pub fn new(client: ConsoleClient, resolver: Arc<DatasourceResolver>) -> Self {
        Self {
            client,
            resolver,
            state: ProbeRequestState::default(),
        }
    }

    pub fn state(&self) -> &ProbeRequestState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ProbeRequestState {
        &mut self.state
    }

    pub fn client(&self) -> &ConsoleClient {
        &self.client
    }

    pub fn response(&self) -> Option<&str> {
        self.state.response()
    }

    /// Start a raw probe from the current endpoint, method and body.
    pub fn begin_raw_probe(&mut self) -> PendingProbe {
        let request = RawProbeRequest {
            endpoint: self.state.endpoint().to_string(),
            method: self.state.method(),
            body: self.state.body().to_string(),
        };
        self.begin(ProbeAction::Raw(request))
    }

    /// Start a resolver probe for the current datasource name.
    pub fn begin_resolver_probe(&mut self) -> PendingProbe {
        let datasource_name = self.state.datasource_name().to_string();
        self.begin(ProbeAction::Resolve { datasource_name })
    }

    /// Apply a finished probe. Completions from superseded probes are dropped.
    /// Returns whether the response field changed.
    pub fn complete(&mut self, completion: ProbeCompletion) -> bool {
        let ProbeCompletion { ticket, outcome } = completion;
        let text = match outcome {
            Ok(text) => text,
            Err(err) => {
                error!(ticket = ticket.value(), error = %err, "probe failed");
                err.to_string()
            }
        };

        let applied = self.state.apply(ticket, text);
        if !applied {
            debug!(
                ticket = ticket.value(),
                latest = self.state.latest_ticket().value(),
                "discarding stale probe response"
            );
        }
        applied
    }

    /// Run a raw probe to completion and return the response field.
    pub async fn fetch_endpoint(&mut self) -> Option<&str> {
        let completion = self.begin_raw_probe().run().await;
        self.complete(completion);
        self.response()
    }

    /// Run a resolver probe to completion and return the response field.
    pub async fn fetch_datasource(&mut self) -> Option<&str> {
        let completion = self.begin_resolver_probe().run().await;
        self.complete(completion);
        self.response()
    }

    fn begin(&mut self, action: ProbeAction) -> PendingProbe {
        let ticket = self.state.issue_ticket();
        debug!(ticket = ticket.value(), ?action, "probe started");
        PendingProbe::new(ticket, action, self.client.clone(), Arc::clone(&self.resolver))
    }
}
