//! Runtime configuration: command-line flag, then environment, then default.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use dashprobe_api::{ConsoleClient, DEFAULT_CONSOLE_URL};
use dashprobe_resolver::{DatasourceLookup, FixedKindLookup, HttpDatasourceLookup, YamlDatasourceLookup};

pub const CONSOLE_URL_ENV: &str = "DASHPROBE_CONSOLE_URL";
pub const COOKIE_ENV: &str = "DASHPROBE_COOKIE";
pub const FIXED_KIND_ENV: &str = "DASHPROBE_FIXED_KIND";
pub const DATASOURCE_FILES_ENV: &str = "DASHPROBE_DATASOURCE_FILES";
pub const LOG_LEVEL_ENV: &str = "RUST_LOG";

const DEFAULT_LOG_LEVEL: &str = "info";

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Console origin that proxies to the plugin backend [env: DASHPROBE_CONSOLE_URL] [default: http://localhost:9000]
    #[arg(long, global = true)]
    pub console_url: Option<String>,

    /// Raw cookie header sent with every request; its csrf-token feeds X-CSRFToken [env: DASHPROBE_COOKIE]
    #[arg(long, global = true)]
    pub cookie: Option<String>,

    /// Resolve every datasource to this kind without contacting the backend [env: DASHPROBE_FIXED_KIND]
    #[arg(long, global = true)]
    pub fixed_kind: Option<String>,

    /// dashboard-datasource.yaml documents to resolve from; takes precedence over --fixed-kind [env: DASHPROBE_DATASOURCE_FILES]
    #[arg(long = "datasource-file", global = true)]
    pub datasource_files: Vec<PathBuf>,

    /// Log filter, e.g. `debug` or `dashprobe_resolver=trace` [env: RUST_LOG] [default: info]
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

/// Where cache misses are resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupSource {
    Backend,
    FixedKind(String),
    Files(Vec<PathBuf>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub console_url: String,
    pub cookie: String,
    pub lookup: LookupSource,
    pub log_level: String,
}

impl ProbeConfig {
    pub fn from_args(args: &GlobalArgs) -> Self {
        let console_url = merge_env_value(CONSOLE_URL_ENV, args.console_url.as_deref(), DEFAULT_CONSOLE_URL);
        let cookie = merge_env_value(COOKIE_ENV, args.cookie.as_deref(), "");
        let fixed_kind = merge_env_value(FIXED_KIND_ENV, args.fixed_kind.as_deref(), "");
        let log_level = merge_env_value(LOG_LEVEL_ENV, args.log_level.as_deref(), DEFAULT_LOG_LEVEL);

        let datasource_files = if args.datasource_files.is_empty() {
            env::var(DATASOURCE_FILES_ENV)
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|path| !path.is_empty())
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_default()
        } else {
            args.datasource_files.clone()
        };

        let lookup = if !datasource_files.is_empty() {
            LookupSource::Files(datasource_files)
        } else if !fixed_kind.is_empty() {
            LookupSource::FixedKind(fixed_kind)
        } else {
            LookupSource::Backend
        };

        Self {
            console_url,
            cookie,
            lookup,
            log_level,
        }
    }

    pub fn build_client(&self) -> anyhow::Result<ConsoleClient> {
        Ok(ConsoleClient::new(&self.console_url)?.with_cookie_header(self.cookie.clone()))
    }

    pub fn build_lookup(&self, client: &ConsoleClient) -> anyhow::Result<Arc<dyn DatasourceLookup>> {
        let lookup: Arc<dyn DatasourceLookup> = match &self.lookup {
            LookupSource::Backend => Arc::new(HttpDatasourceLookup::new(client.clone())),
            LookupSource::FixedKind(kind) => Arc::new(FixedKindLookup::new(kind.clone())),
            LookupSource::Files(paths) => Arc::new(YamlDatasourceLookup::from_files(paths)?),
        };
        Ok(lookup)
    }
}

/// Flag value if non-empty, else the environment variable if non-empty, else the default.
fn merge_env_value(key: &str, arg: Option<&str>, default_value: &str) -> String {
    if let Some(arg) = arg.map(str::trim).filter(|value| !value.is_empty()) {
        return arg.to_string();
    }

    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default_value.to_string(),
    }
}
