//! Line-oriented interactive console.
//!
//! Each line edits a field or fires a probe. Probes run on the runtime while
//! the operator keeps typing; whichever probe was fired last owns the
//! response field.

use std::str::FromStr;

use dashprobe_console::{PendingProbe, ProbeCompletion, ProbeConsole};
use dashprobe_types::HttpMethod;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const HELP: &str = "\
commands:
  endpoint <url>       set the endpoint (relative to the console URL or absolute)
  method <GET|POST>    set the HTTP method
  body <text>          set the request body (sent with POST)
  name <datasource>    set the datasource name
  cookie <header>      replace the cookie header (csrf-token=...; ...)
  fetch                fetch the endpoint
  resolve              resolve the datasource name
  show                 print the current fields and response
  help                 print this help
  quit                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Endpoint(String),
    Method(HttpMethod),
    Body(String),
    Name(String),
    Cookie(String),
    Fetch,
    Resolve,
    Show,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match verb.to_ascii_lowercase().as_str() {
            "endpoint" | "url" => Ok(ConsoleCommand::Endpoint(rest.to_string())),
            "method" => rest.parse().map(ConsoleCommand::Method).map_err(|error| error.to_string()),
            "body" => Ok(ConsoleCommand::Body(rest.to_string())),
            "name" => Ok(ConsoleCommand::Name(rest.to_string())),
            "cookie" => Ok(ConsoleCommand::Cookie(rest.to_string())),
            "fetch" => Ok(ConsoleCommand::Fetch),
            "resolve" => Ok(ConsoleCommand::Resolve),
            "show" => Ok(ConsoleCommand::Show),
            "help" | "?" => Ok(ConsoleCommand::Help),
            "quit" | "exit" => Ok(ConsoleCommand::Quit),
            other => Err(format!("unknown command '{other}', try 'help'")),
        }
    }
}

pub async fn run(mut console: ProbeConsole) -> anyhow::Result<()> {
    let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<ProbeCompletion>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    print_state(&console);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => apply(&mut console, command, &completion_tx),
                    Err(message) => println!("{message}"),
                }
            }
            Some(completion) = completion_rx.recv() => {
                if console.complete(completion)
                    && let Some(response) = console.response()
                {
                    println!("{response}");
                }
            }
        }
    }

    Ok(())
}

fn apply(console: &mut ProbeConsole, command: ConsoleCommand, completions: &mpsc::UnboundedSender<ProbeCompletion>) {
    match command {
        ConsoleCommand::Endpoint(endpoint) => console.state_mut().set_endpoint(endpoint),
        ConsoleCommand::Method(method) => console.state_mut().set_method(method),
        ConsoleCommand::Body(body) => console.state_mut().set_body(body),
        ConsoleCommand::Name(name) => console.state_mut().set_datasource_name(name),
        ConsoleCommand::Cookie(cookie) => console.client().set_cookie_header(cookie),
        ConsoleCommand::Fetch => spawn_probe(console.begin_raw_probe(), completions),
        ConsoleCommand::Resolve => spawn_probe(console.begin_resolver_probe(), completions),
        ConsoleCommand::Show => print_state(console),
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
}

fn spawn_probe(probe: PendingProbe, completions: &mpsc::UnboundedSender<ProbeCompletion>) {
    let completions = completions.clone();
    tokio::spawn(async move {
        let _ = completions.send(probe.run().await);
    });
}

fn print_state(console: &ProbeConsole) {
    let state = console.state();
    println!("endpoint: {}", state.endpoint());
    println!("method:   {}", state.method());
    println!("body:     {}", state.body());
    println!("name:     {}", state.datasource_name());
    if let Some(response) = state.response() {
        println!("{response}");
    }
}
