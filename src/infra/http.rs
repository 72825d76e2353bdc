use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Url,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::project::Project;
use crate::domain::ticket::{RewrittenTicket, Ticket, UpdateOutcome};
use crate::error::{AppError, AppResult};
use crate::services::RewriteBackend;

pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let base_url = Self::parse_base_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http, base_url })
    }

    fn parse_base_url(raw: &str) -> AppResult<Url> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::Configuration(
                "backend URL must not be empty".to_string(),
            ));
        }
        let url = Url::parse(trimmed)
            .map_err(|err| AppError::Configuration(format!("invalid backend URL '{trimmed}': {err}")))?;
        if url.cannot_be_a_base() {
            return Err(AppError::Configuration(format!(
                "backend URL '{trimmed}' cannot carry a path"
            )));
        }
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // parse_base_url rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> AppResult<T> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| AppError::Backend(format!("failed to {what}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Backend(format!(
                "backend responded with {status} while trying to {what}: {body}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Backend(format!("failed to parse response to {what}: {err}")))
    }

    fn with_json<B: Serialize + ?Sized>(request: RequestBuilder, body: &B) -> RequestBuilder {
        request.header(CONTENT_TYPE, "application/json").json(body)
    }
}

#[async_trait]
impl RewriteBackend for HttpBackend {
    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        let url = self.endpoint(&["projects"]);
        tracing::debug!(%url, "listing projects");
        self.send(self.http.get(url), "list projects").await
    }

    async fn list_issues(&self, project_key: &str) -> AppResult<Vec<Ticket>> {
        let key = project_key.trim();
        if key.is_empty() {
            return Err(AppError::Validation(
                "project key must not be empty".to_string(),
            ));
        }
        let url = self.endpoint(&["projects", key, "issues"]);
        tracing::debug!(%url, "listing issues");
        self.send(self.http.get(url), "list issues").await
    }

    async fn rewrite_tickets(&self, tickets: &[Ticket]) -> AppResult<Vec<RewrittenTicket>> {
        let url = self.endpoint(&["rewrite-tickets"]);
        tracing::debug!(%url, count = tickets.len(), "requesting rewrites");
        let request = Self::with_json(self.http.post(url), tickets);
        self.send(request, "rewrite tickets").await
    }

    async fn update_tickets(&self, tickets: &[RewrittenTicket]) -> AppResult<UpdateOutcome> {
        let url = self.endpoint(&["update-tickets"]);
        tracing::debug!(%url, count = tickets.len(), "submitting approved rewrites");
        let request = Self::with_json(self.http.put(url), &UpdateTicketsRequest { tickets });
        self.send(request, "update tickets").await
    }
}

#[derive(Serialize)]
struct UpdateTicketsRequest<'a> {
    tickets: &'a [RewrittenTicket],
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use super::*;
    use crate::workflow::workspace::Workspace;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    /// Answers one connection per canned `(status, body)` pair, in order, and
    /// returns the request lines it received.
    async fn serve(
        responses: Vec<(&'static str, &'static str)>,
    ) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                seen.push(read_request(&mut stream).await);
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            seen
        });
        (format!("http://{addr}"), handle)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let read = stream.read(&mut chunk).await.unwrap();
            assert!(read > 0, "client hung up before finishing its headers");
            raw.extend_from_slice(&chunk[..read]);
            if let Some(pos) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&raw[..header_end]).into_owned();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while raw.len() < header_end + content_length {
            let read = stream.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..read]);
        }
        head.lines().next().unwrap_or_default().to_string()
    }

    fn rewrite_of(key: &str) -> RewrittenTicket {
        RewrittenTicket {
            key: key.to_string(),
            original_title: "login broken".to_string(),
            rewritten_title: "Fix login redirect".to_string(),
            rewritten_description: "Users land on a 404.".to_string(),
            acceptance_criteria: vec!["Redirect works".to_string()],
        }
    }

    #[test]
    fn joins_endpoints_onto_base_url() {
        let backend = backend("http://localhost:8000");
        assert_eq!(
            backend.endpoint(&["projects"]).as_str(),
            "http://localhost:8000/projects"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let backend = backend("https://tools.example.com/rewriter/");
        assert_eq!(
            backend.endpoint(&["projects", "OPS", "issues"]).as_str(),
            "https://tools.example.com/rewriter/projects/OPS/issues"
        );
    }

    #[test]
    fn encodes_project_key_segment() {
        let backend = backend("http://localhost:8000");
        assert_eq!(
            backend.endpoint(&["projects", "A/B C", "issues"]).as_str(),
            "http://localhost:8000/projects/A%2FB%20C/issues"
        );
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(matches!(
            HttpBackend::new("  ", Duration::from_secs(1)),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            HttpBackend::new("not a url", Duration::from_secs(1)),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            HttpBackend::new("mailto:team@example.com", Duration::from_secs(1)),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn update_request_wraps_tickets() {
        let tickets = vec![rewrite_of("OPS-1")];
        let json = serde_json::to_value(UpdateTicketsRequest { tickets: &tickets }).unwrap();
        assert_eq!(json["tickets"][0]["key"], "OPS-1");
        assert_eq!(json["tickets"][0]["acceptance_criteria"][0], "Redirect works");
    }

    #[tokio::test]
    async fn empty_project_key_fails_before_any_request() {
        let backend = backend("http://localhost:8000");
        let result = backend.list_issues("   ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn server_error_carries_status_and_body() {
        let (base, server) = serve(vec![("500 Internal Server Error", "backend exploded")]).await;

        match backend(&base).list_projects().await {
            Err(AppError::Backend(message)) => {
                assert!(message.contains("500"), "{message}");
                assert!(message.contains("while trying to list projects"), "{message}");
                assert!(message.ends_with("backend exploded"), "{message}");
            }
            other => panic!("expected backend error, got {other:?}"),
        }
        assert_eq!(server.await.unwrap(), vec!["GET /projects HTTP/1.1"]);
    }

    #[tokio::test]
    async fn malformed_json_is_a_backend_error() {
        let (base, server) = serve(vec![("200 OK", "not json")]).await;

        match backend(&base).list_issues("OPS").await {
            Err(AppError::Backend(message)) => {
                assert!(
                    message.starts_with("failed to parse response to list issues"),
                    "{message}"
                );
            }
            other => panic!("expected backend error, got {other:?}"),
        }
        assert_eq!(server.await.unwrap(), vec!["GET /projects/OPS/issues HTTP/1.1"]);
    }

    #[tokio::test]
    async fn update_reports_failed_tickets() {
        let (base, server) = serve(vec![(
            "200 OK",
            r#"{"success":false,"failed_tickets":[{"key":"OPS-2"}]}"#,
        )])
        .await;

        let outcome = backend(&base)
            .update_tickets(&[rewrite_of("OPS-1"), rewrite_of("OPS-2")])
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.failed_keys(), vec!["OPS-2"]);
        assert_eq!(server.await.unwrap(), vec!["PUT /update-tickets HTTP/1.1"]);
    }

    #[tokio::test]
    async fn bare_update_rejection_fails_the_approve() {
        let (base, server) = serve(vec![
            (
                "200 OK",
                r#"[{"id":10001,"key":"OPS","name":"Operations","projectTypeKey":"software"}]"#,
            ),
            (
                "200 OK",
                r#"[{"key":"OPS-1","summary":"login broken","description":"404 after SSO"}]"#,
            ),
            (
                "200 OK",
                r#"[{"key":"OPS-1","original_title":"login broken","rewritten_title":"Fix login redirect","rewritten_description":"Users land on a 404.","acceptance_criteria":["Redirect works"]}]"#,
            ),
            ("200 OK", r#"{"success":false}"#),
        ])
        .await;

        let mut workspace = Workspace::new(Arc::new(backend(&base)));
        workspace.select_project_by_key("OPS").await.unwrap();
        assert!(workspace.toggle("OPS-1"));
        workspace.rewrite_selected().await.unwrap();

        match workspace.approve().await {
            Err(err @ AppError::PartialFailure { .. }) => {
                assert_eq!(err.to_string(), "The backend rejected the ticket update.");
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
        assert_eq!(workspace.error(), Some("The backend rejected the ticket update."));
        assert_eq!(workspace.success(), None);
        assert_eq!(workspace.rewrites().len(), 1);
        assert_eq!(
            server.await.unwrap(),
            vec![
                "GET /projects HTTP/1.1",
                "GET /projects/OPS/issues HTTP/1.1",
                "POST /rewrite-tickets HTTP/1.1",
                "PUT /update-tickets HTTP/1.1",
            ]
        );
    }
}
