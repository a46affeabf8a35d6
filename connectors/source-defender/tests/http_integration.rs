//! `DefenderClient` against a canned local HTTP server.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alerttail_types::SourceError;
use source_defender::{ClientSettings, DefenderClient, FetchParams};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    target: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.query_params(name).into_iter().next()
    }

    fn query_params(&self, name: &str) -> Vec<String> {
        let url = reqwest::Url::parse(&format!("http://localhost{}", self.target)).unwrap();
        url.query_pairs()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .collect()
    }
}

type Log = Arc<Mutex<Vec<Recorded>>>;

/// Serve `responses` in order, one per connection, recording each request.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Log) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let log: Log = Arc::default();
    let queue = Arc::new(Mutex::new(VecDeque::from(responses)));

    let task_log = Arc::clone(&log);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut stream).await;
            task_log.lock().unwrap().push(request);

            let (status, body) = queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or((500, r#"{"error":{"code":"NoMoreResponses","message":"queue empty"}}"#));
            let reply = format!(
                "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(reply.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (base, log)
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap().split(' ');
    let method = request_line.next().unwrap().to_string();
    let target = request_line.next().unwrap().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .map_or(0, |(_, v)| v.parse().unwrap());
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed mid-body");
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..header_end + content_length]).into_owned();

    Recorded {
        method,
        target,
        headers,
        body,
    }
}

fn settings(base: &str) -> ClientSettings {
    ClientSettings {
        base_url: base.to_string(),
        token_url: format!("{base}/contoso/oauth2/token"),
        resource: "https://api.securitycenter.windows.com".to_string(),
        api_version: None,
        client_id: "app-id".to_string(),
        client_secret: "app-secret".to_string(),
        timeout: Duration::from_secs(5),
    }
}

const TOKEN_1: &str = r#"{"token_type":"Bearer","expires_in":"3599","access_token":"tok-1"}"#;
const TOKEN_2: &str = r#"{"token_type":"Bearer","expires_in":"3599","access_token":"tok-2"}"#;
const PAGE: &str = r#"{"@odata.context":"x","value":[{"id":"da1"},{"id":"da2"}]}"#;
const EMPTY_PAGE: &str = r#"{"value":[]}"#;
const FILTER: &str =
    "alertCreationTime gt 2026-01-01T00:00:00Z and alertCreationTime le 2026-01-01T00:05:00.5Z";

#[tokio::test]
async fn test_lists_alerts_with_bearer_token_and_filter() {
    let (base, log) = serve(vec![(200, TOKEN_1), (200, PAGE)]).await;
    let client = DefenderClient::new(&settings(&base)).unwrap();

    let alerts = client.list_alerts(FILTER).await.unwrap();
    let ids: Vec<_> = alerts.iter().map(|a| a.id.clone().unwrap()).collect();
    assert_eq!(ids, ["da1", "da2"]);

    let log = log.lock().unwrap().clone();
    assert_eq!(log.len(), 2);

    let token_req = &log[0];
    assert_eq!(token_req.method, "POST");
    assert_eq!(token_req.target, "/contoso/oauth2/token");
    assert!(token_req.body.contains("grant_type=client_credentials"));
    assert!(token_req.body.contains("client_id=app-id"));
    assert!(token_req.body.contains("client_secret=app-secret"));
    assert!(token_req
        .body
        .contains("resource=https%3A%2F%2Fapi.securitycenter.windows.com"));

    let list_req = &log[1];
    assert_eq!(list_req.method, "GET");
    assert!(list_req.target.starts_with("/api/alerts?"));
    assert_eq!(list_req.query_param("$filter").as_deref(), Some(FILTER));
    assert_eq!(list_req.header("authorization"), Some("Bearer tok-1"));
    assert_eq!(list_req.header("user-agent"), Some("alerttail"));
    assert_eq!(list_req.header("accept"), Some("application/json"));
}

#[tokio::test]
async fn test_token_is_reused_until_refresh() {
    let (base, log) = serve(vec![(200, TOKEN_1), (200, PAGE), (200, EMPTY_PAGE)]).await;
    let client = DefenderClient::new(&settings(&base)).unwrap();

    assert_eq!(client.list_alerts(FILTER).await.unwrap().len(), 2);
    assert!(client.list_alerts(FILTER).await.unwrap().is_empty());

    let log = log.lock().unwrap().clone();
    assert_eq!(log.len(), 3, "one token request, two listings");
    assert_eq!(log[2].header("authorization"), Some("Bearer tok-1"));
}

#[tokio::test]
async fn test_api_error_body_is_surfaced() {
    let (base, _log) = serve(vec![
        (200, TOKEN_1),
        (
            400,
            r#"{"error":{"code":"InvalidRequestBody","message":"Invalid filter","target":"c0ffee"}}"#,
        ),
    ])
    .await;
    let client = DefenderClient::new(&settings(&base)).unwrap();

    match client.list_alerts(FILTER).await.unwrap_err() {
        SourceError::Api { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body.code, "InvalidRequestBody");
            assert_eq!(body.target, "c0ffee");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unauthorized_forces_new_token() {
    let (base, log) = serve(vec![
        (200, TOKEN_1),
        (401, r#"{"error":{"code":"Unauthorized","message":"expired"}}"#),
        (200, TOKEN_2),
        (200, PAGE),
    ])
    .await;
    let client = DefenderClient::new(&settings(&base)).unwrap();

    let err = client.list_alerts(FILTER).await.unwrap_err();
    assert!(matches!(err, SourceError::Api { status: 401, .. }), "got: {err}");

    assert_eq!(client.list_alerts(FILTER).await.unwrap().len(), 2);
    let log = log.lock().unwrap().clone();
    assert_eq!(log.len(), 4);
    assert_eq!(log[3].header("authorization"), Some("Bearer tok-2"));
}

#[tokio::test]
async fn test_token_failure_is_auth_error() {
    let (base, _log) = serve(vec![(
        400,
        r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret"}"#,
    )])
    .await;
    let client = DefenderClient::new(&settings(&base)).unwrap();

    let err = client.list_alerts(FILTER).await.unwrap_err();
    assert_eq!(err.kind(), "auth");
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("invalid_client"), "got: {err}");
}

#[tokio::test]
async fn test_unreachable_token_endpoint_is_auth_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = DefenderClient::new(&settings(&base)).unwrap();

    let err = client.list_alerts(FILTER).await.unwrap_err();
    assert_eq!(err.kind(), "auth");
    assert!(err.to_string().contains("token request failed"), "got: {err}");
}

#[tokio::test]
async fn test_versioned_route_is_requested() {
    let (base, log) = serve(vec![(200, TOKEN_1), (200, EMPTY_PAGE)]).await;
    let client = DefenderClient::new(&ClientSettings {
        api_version: Some("v1.0".to_string()),
        ..settings(&base)
    })
    .unwrap();

    assert!(client.list_alerts(FILTER).await.unwrap().is_empty());
    let log = log.lock().unwrap().clone();
    assert!(log[1].target.starts_with("/api/v1.0/alerts?"), "got: {}", log[1].target);
}

#[tokio::test]
async fn test_fetch_sends_selection_parameters() {
    let (base, log) = serve(vec![(200, TOKEN_1), (200, PAGE)]).await;
    let client = DefenderClient::new(&settings(&base)).unwrap();
    let query = FetchParams {
        ago: Some("PT12H".to_string()),
        limit: Some(10),
        machine_groups: vec!["servers".to_string(), "laptops".to_string()],
        ..FetchParams::default()
    }
    .to_query()
    .unwrap();

    assert_eq!(client.fetch_alerts(&query).await.unwrap().len(), 2);

    let log = log.lock().unwrap().clone();
    let req = &log[1];
    assert!(req.target.starts_with("/api/alerts?"));
    assert_eq!(req.query_param("ago").as_deref(), Some("PT12H"));
    assert_eq!(req.query_param("limit").as_deref(), Some("10"));
    assert_eq!(req.query_params("machinegroups"), ["servers", "laptops"]);
    assert_eq!(req.query_param("$filter"), None);
    assert_eq!(req.header("authorization"), Some("Bearer tok-1"));
}
