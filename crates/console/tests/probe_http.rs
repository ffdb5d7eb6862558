use std::sync::Arc;

use dashprobe_api::ConsoleClient;
use dashprobe_console::ProbeConsole;
use dashprobe_resolver::{DatasourceResolver, HttpDatasourceLookup};
use dashprobe_types::HttpMethod;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve one canned HTTP response on a loopback port and hand back the raw
/// request that was received.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (sender, receiver) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = sender.send(request);
    });

    (format!("http://{address}"), receiver)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = socket.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&buffer).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buffer).to_string()
}

fn header_value<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    request
        .split("\r\n\r\n")
        .next()?
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(header, _)| header.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}

fn request_body(request: &str) -> &str {
    request.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or("")
}

fn console_for(base_url: &str, cookie: &str) -> ProbeConsole {
    console_with_resolver(base_url, cookie).0
}

fn console_with_resolver(base_url: &str, cookie: &str) -> (ProbeConsole, Arc<DatasourceResolver>) {
    let client = ConsoleClient::new(base_url).unwrap().with_cookie_header(cookie);
    let resolver = Arc::new(DatasourceResolver::new(Arc::new(HttpDatasourceLookup::new(client.clone()))));
    (ProbeConsole::new(client, resolver.clone()), resolver)
}

#[tokio::test]
async fn get_probe_pretty_prints_json_without_csrf_header() {
    let (base_url, request) = serve_once("200 OK", r#"{"status":"success"}"#).await;
    let mut console = console_for(&base_url, "csrf-token=tok-123");
    console.state_mut().set_endpoint("/api/v1/status/config");

    let response = console.fetch_endpoint().await.unwrap().to_string();
    assert_eq!(response, "{\n  \"status\": \"success\"\n}");

    let request = request.await.unwrap();
    assert!(request.starts_with("GET /api/v1/status/config HTTP/1.1"));
    assert_eq!(header_value(&request, "content-type"), Some("application/json"));
    assert_eq!(header_value(&request, "x-csrftoken"), None);
    assert_eq!(request_body(&request), "");
}

#[tokio::test]
async fn post_probe_sends_csrf_token_and_json_body() {
    let (base_url, request) = serve_once("200 OK", r#"{"accepted":true}"#).await;
    let mut console = console_for(&base_url, "openshift-session-token=abc; csrf-token=tok-123");
    console.state_mut().set_endpoint("/api/v1/query");
    console.state_mut().set_method(HttpMethod::Post);
    console.state_mut().set_body("up");

    let response = console.fetch_endpoint().await.unwrap().to_string();
    assert_eq!(response, "{\n  \"accepted\": true\n}");

    let request = request.await.unwrap();
    assert!(request.starts_with("POST /api/v1/query HTTP/1.1"));
    assert_eq!(header_value(&request, "x-csrftoken"), Some("tok-123"));
    assert_eq!(header_value(&request, "content-type"), Some("application/json"));
    assert_eq!(
        header_value(&request, "cookie"),
        Some("openshift-session-token=abc; csrf-token=tok-123")
    );
    assert_eq!(request_body(&request), "\"up\"");
}

#[tokio::test]
async fn post_probe_reads_cookie_at_call_time() {
    let (base_url, request) = serve_once("200 OK", "{}").await;
    let mut console = console_for(&base_url, "csrf-token=old");
    console.state_mut().set_method(HttpMethod::Post);
    console.state_mut().set_endpoint("/submit");
    console.client().set_cookie_header("csrf-token=new");

    console.fetch_endpoint().await;

    let request = request.await.unwrap();
    assert_eq!(header_value(&request, "x-csrftoken"), Some("new"));
}

#[tokio::test]
async fn non_success_status_fails_even_with_json_body() {
    let (base_url, _request) = serve_once("503 Service Unavailable", r#"{"status":"success"}"#).await;
    let mut console = console_for(&base_url, "");
    console.state_mut().set_endpoint("/api/v1/status/config");

    let response = console.fetch_endpoint().await.unwrap();
    assert!(response.starts_with("Invalid response: 503"), "unexpected response: {response}");
}

#[tokio::test]
async fn non_json_success_body_is_a_failure() {
    let (base_url, _request) = serve_once("200 OK", "ok").await;
    let mut console = console_for(&base_url, "");
    console.state_mut().set_endpoint("/health");

    let response = console.fetch_endpoint().await.unwrap();
    assert!(response.starts_with("Invalid JSON response"), "unexpected response: {response}");
}

#[tokio::test]
async fn unreachable_endpoint_renders_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let mut console = console_for(&format!("http://{address}"), "");
    console.state_mut().set_endpoint("/api/v1/status/config");

    let response = console.fetch_endpoint().await.unwrap();
    assert!(response.starts_with("Network error"), "unexpected response: {response}");
}

#[tokio::test]
async fn resolver_probe_fetches_datasource_document() {
    let document = r#"{"kind":"Datasource","metadata":{"name":"cluster-prometheus-proxy"},"spec":{"plugin":{"kind":"prometheus","spec":{"direct_url":""}}}}"#;
    let (base_url, request) = serve_once("200 OK", document).await;
    let mut console = console_for(&base_url, "");

    let response = console.fetch_datasource().await.unwrap().to_string();
    assert_eq!(
        response,
        "{\n  \"basePath\": \"/api/proxy/plugin/console-dashboards-plugin/backend/proxy/cluster-prometheus-proxy\",\n  \"dataSourceType\": \"prometheus\"\n}"
    );

    let request = request.await.unwrap();
    assert!(request.starts_with(
        "GET /api/proxy/plugin/console-dashboards-plugin/backend/api/v1/datasources/cluster-prometheus-proxy HTTP/1.1"
    ));

    // Served from the cache: the loopback server only answers once.
    let again = console.fetch_datasource().await.unwrap().to_string();
    assert_eq!(again, response);
}

#[tokio::test]
async fn resolver_probe_reports_backend_status() {
    let (base_url, _request) = serve_once("404 Not Found", "datasource not found").await;
    let mut console = console_for(&base_url, "");
    console.state_mut().set_datasource_name("missing-datasource");

    let response = console.fetch_datasource().await.unwrap();
    assert!(
        response.starts_with("cannot resolve datasource 'missing-datasource'"),
        "unexpected response: {response}"
    );
    assert!(response.contains("404"));
}

#[tokio::test]
async fn post_probe_without_csrf_cookie_sends_empty_header() {
    let (base_url, request) = serve_once("200 OK", "{}").await;
    let mut console = console_for(&base_url, "openshift-session-token=abc");
    console.state_mut().set_method(HttpMethod::Post);
    console.state_mut().set_endpoint("/submit");

    let response = console.fetch_endpoint().await.unwrap().to_string();
    assert_eq!(response, "{}");

    let request = request.await.unwrap();
    assert_eq!(header_value(&request, "x-csrftoken"), Some(""));
}

#[tokio::test]
async fn unparseable_datasource_document_is_not_cached() {
    let (base_url, _request) = serve_once("200 OK", "<html>login</html>").await;
    let (mut console, resolver) = console_with_resolver(&base_url, "");

    let response = console.fetch_datasource().await.unwrap();
    assert!(
        response.starts_with("cannot resolve datasource 'cluster-prometheus-proxy'"),
        "unexpected response: {response}"
    );
    assert_eq!(resolver.cached_entries(), 0);
}

#[tokio::test]
async fn https_console_reaches_tls_handshake() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (sender, first_bytes) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut record = [0u8; 2];
        socket.read_exact(&mut record).await.unwrap();
        let _ = sender.send(record);
    });

    let mut console = console_for(&format!("https://localhost:{}", address.port()), "");
    console.state_mut().set_endpoint("/api/v1/status/config");

    let response = console.fetch_endpoint().await.unwrap().to_string();
    assert!(response.starts_with("Network error"), "unexpected response: {response}");
    assert!(!response.contains("scheme is not http"), "unexpected response: {response}");

    // A TLS handshake record starts with content type 0x16 and major version 3.
    assert_eq!(first_bytes.await.unwrap(), [0x16, 0x03]);
}
