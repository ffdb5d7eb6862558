//! Shared type definitions for the dashprobe workspace.
//!
//! - [`DataSource`] mirrors the datasource document served by the dashboards
//!   plugin backend (and stored in `dashboard-datasource.yaml` ConfigMap keys).
//! - [`DatasourceDescriptor`] is the resolved, cacheable view of a datasource.
//! - [`HttpMethod`] enumerates the methods the probe console can issue.

mod datasource;
mod method;

pub use datasource::{DataSource, DatasourceDescriptor, DatasourceMetadata, DatasourcePlugin, DatasourcePluginSpec, DatasourceSpec};
pub use method::{HttpMethod, ParseMethodError};
