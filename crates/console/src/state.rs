//! Editable request parameters and the shared response field.

use dashprobe_types::HttpMethod;

/// Endpoint pre-filled when the console opens.
pub const DEFAULT_PROXY_URL: &str =
    "/api/proxy/plugin/console-dashboards-plugin/backend/proxy/cluster-prometheus-proxy/api/v1/status/config";

/// Datasource name pre-filled when the console opens.
pub const DEFAULT_DATASOURCE_NAME: &str = "cluster-prometheus-proxy";

/// Identifies one probe. Tickets increase monotonically per console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProbeTicket(u64);

impl ProbeTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Operator-editable probe parameters plus the last rendered outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequestState {
    endpoint: String,
    method: HttpMethod,
    body: String,
    datasource_name: String,
    response: Option<String>,
    latest_ticket: ProbeTicket,
}

impl Default for ProbeRequestState {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PROXY_URL.to_string(),
            method: HttpMethod::Get,
            body: String::new(),
            datasource_name: DEFAULT_DATASOURCE_NAME.to_string(),
            response: None,
            latest_ticket: ProbeTicket::default(),
        }
    }
}

impl ProbeRequestState {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = method;
    }

    /// Request body text. Only sent with POST.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn datasource_name(&self) -> &str {
        &self.datasource_name
    }

    pub fn set_datasource_name(&mut self, datasource_name: impl Into<String>) {
        self.datasource_name = datasource_name.into();
    }

    /// Last applied outcome: pretty-printed JSON or an error description.
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub fn latest_ticket(&self) -> ProbeTicket {
        self.latest_ticket
    }

    /// Issue the ticket for a new probe, superseding every earlier one.
    pub fn issue_ticket(&mut self) -> ProbeTicket {
        self.latest_ticket = ProbeTicket(self.latest_ticket.0 + 1);
        self.latest_ticket
    }

    /// Write `text` into the response field if `ticket` is the latest one.
    /// Returns whether the text was applied.
    pub fn apply(&mut self, ticket: ProbeTicket, text: String) -> bool {
        if ticket != self.latest_ticket {
            return false;
        }
        self.response = Some(text);
        true
    }
}
