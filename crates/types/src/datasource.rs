use serde::{Deserialize, Serialize};

/// Datasource document as returned by `GET /api/v1/datasources/{name}`.
///
/// Example:
/// ```json
/// {"kind":"Datasource","metadata":{"name":"cluster-prometheus-proxy"},
///  "spec":{"plugin":{"kind":"prometheus","spec":{"direct_url":""}}}}
/// ```
///
/// Every field defaults when absent so callers can decide which parts they
/// actually require.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: DatasourceMetadata,
    #[serde(default)]
    pub spec: DatasourceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceSpec {
    #[serde(default)]
    pub plugin: DatasourcePlugin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourcePlugin {
    /// Backend kind, e.g. `prometheus`.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub spec: DatasourcePluginSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourcePluginSpec {
    #[serde(default)]
    pub direct_url: String,
}

impl DataSource {
    /// Returns the declared plugin kind, or `None` when it is blank.
    pub fn plugin_kind(&self) -> Option<&str> {
        let kind = self.spec.plugin.kind.trim();
        if kind.is_empty() { None } else { Some(kind) }
    }
}

/// Resolved addressing information for a datasource.
///
/// `base_path` is the URL path prefix through which proxied requests must be
/// routed; `data_source_type` identifies the backend kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceDescriptor {
    pub base_path: String,
    pub data_source_type: String,
}

impl DatasourceDescriptor {
    pub fn new(base_path: impl Into<String>, data_source_type: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            data_source_type: data_source_type.into(),
        }
    }
}
