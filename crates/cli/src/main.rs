mod config;
mod interactive;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dashprobe_console::{ProbeCompletion, ProbeConsole};
use dashprobe_resolver::DatasourceResolver;
use dashprobe_types::HttpMethod;
use tracing::{debug, info};

use crate::config::{GlobalArgs, ProbeConfig};

#[derive(Debug, Parser)]
#[command(name = "dashprobe", version, about = "Probe the console dashboards plugin backend")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one request to an endpoint and print the JSON response
    Fetch {
        /// Endpoint path (relative to the console URL) or absolute URL
        #[arg(long)]
        endpoint: Option<String>,

        #[arg(long, default_value = "GET")]
        method: HttpMethod,

        /// Request body, sent as a JSON value with POST
        #[arg(long)]
        body: Option<String>,
    },
    /// Resolve a datasource name to its proxy base path and kind
    Datasource {
        /// Datasource name [default: cluster-prometheus-proxy]
        name: Option<String>,
    },
    /// Interactive console (the default when no subcommand is given)
    Console,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = ProbeConfig::from_args(&cli.global);
    init_tracing(&config.log_level);
    debug!(console_url = %config.console_url, lookup = ?config.lookup, log_level = %config.log_level, "configuration loaded");

    let client = config.build_client()?;
    let lookup = config.build_lookup(&client)?;
    info!(console = %client.base_url, lookup = %lookup.describe(), "dashprobe ready");

    let resolver = Arc::new(DatasourceResolver::new(lookup));
    let mut console = ProbeConsole::new(client, resolver);

    match cli.command.unwrap_or(Command::Console) {
        Command::Fetch { endpoint, method, body } => {
            let state = console.state_mut();
            if let Some(endpoint) = endpoint {
                state.set_endpoint(endpoint);
            }
            state.set_method(method);
            if let Some(body) = body {
                state.set_body(body);
            }
            let completion = console.begin_raw_probe().run().await;
            Ok(report(&mut console, completion))
        }
        Command::Datasource { name } => {
            if let Some(name) = name {
                console.state_mut().set_datasource_name(name);
            }
            let completion = console.begin_resolver_probe().run().await;
            Ok(report(&mut console, completion))
        }
        Command::Console => {
            interactive::run(console).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn report(console: &mut ProbeConsole, completion: ProbeCompletion) -> ExitCode {
    let failed = completion.outcome.is_err();
    console.complete(completion);
    if let Some(response) = console.response() {
        println!("{response}");
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn init_tracing(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
