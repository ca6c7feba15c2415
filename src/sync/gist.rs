use crate::config::SyncConfig;
use crate::sync::error::SyncError;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const MIN_TIMEOUT_SECONDS: u64 = 5;

/// A remotely hosted JSON document made of named files.
pub trait RemoteDocument {
    /// Returns the content of the first file, or `None` when the document has
    /// no file content at all.
    fn fetch_document(&self, id: &str, token: Option<&str>) -> Result<Option<String>, SyncError>;

    /// Replaces the content of the fixed sync file inside the document.
    fn save_document(&self, id: &str, token: &str, content: &str) -> Result<(), SyncError>;
}

#[derive(Deserialize)]
struct GistDocument {
    #[serde(default)]
    files: BTreeMap<String, GistFile>,
}

#[derive(Deserialize)]
struct GistFile {
    content: Option<String>,
}

#[derive(Serialize)]
struct GistUpdateRequest<'a> {
    files: BTreeMap<&'a str, GistFileContent<'a>>,
}

#[derive(Serialize)]
struct GistFileContent<'a> {
    content: &'a str,
}

#[derive(Clone, Debug)]
pub struct GistClient {
    client: Client,
    api_base: String,
    file_name: String,
}

impl GistClient {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                config.timeout_seconds.max(MIN_TIMEOUT_SECONDS),
            ))
            .build()
            .map_err(|e| SyncError::Request(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            file_name: config.file_name.clone(),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn gist_url(&self, id: &str) -> String {
        format!("{}/gists/{}", self.api_base, id.trim())
    }
}

impl RemoteDocument for GistClient {
    fn fetch_document(&self, id: &str, token: Option<&str>) -> Result<Option<String>, SyncError> {
        let mut request = self
            .client
            .get(self.gist_url(id))
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, user_agent());
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let resp = request.send()?;
        let status = resp.status();
        if !status.is_success() {
            if status == StatusCode::NOT_FOUND {
                return Err(SyncError::NotFound);
            }
            return Err(http_error(status));
        }

        let body = resp.text()?;
        let document: GistDocument = serde_json::from_str(&body)?;
        Ok(document
            .files
            .into_values()
            .next()
            .and_then(|file| file.content)
            .filter(|content| !content.is_empty()))
    }

    fn save_document(&self, id: &str, token: &str, content: &str) -> Result<(), SyncError> {
        let mut files = BTreeMap::new();
        files.insert(self.file_name.as_str(), GistFileContent { content });

        let resp = self
            .client
            .patch(self.gist_url(id))
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, user_agent())
            .bearer_auth(token)
            .json(&GistUpdateRequest { files })
            .send()?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        match status {
            StatusCode::CONFLICT => Err(SyncError::Conflict),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::Auth(status.as_u16())),
            _ => Err(http_error(status)),
        }
    }
}

fn http_error(status: StatusCode) -> SyncError {
    SyncError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
    }
}

fn user_agent() -> String {
    format!("weekplan/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    /// Answers exactly one request with the given status and body and hands
    /// back the raw request text.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let request = read_request(&mut stream);
            stream.write_all(response.as_bytes()).expect("write");
            request
        });
        (format!("http://{addr}"), handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).expect("read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn client_for(base: &str) -> GistClient {
        GistClient::new(&SyncConfig {
            api_base: format!("{base}/"),
            ..SyncConfig::default()
        })
        .expect("client")
    }

    #[test]
    fn fetch_returns_first_file_content_with_bearer_token() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"id":"abc","files":{"a.json":{"content":"[]"},"b.json":{"content":"[1]"}}}"#,
        );
        let content = client_for(&base)
            .fetch_document("abc", Some("secret"))
            .expect("fetch");
        assert_eq!(content, Some("[]".to_string()));

        let request = server.join().expect("server");
        assert!(request.starts_with("GET /gists/abc HTTP/1.1"));
        assert!(request.to_lowercase().contains("authorization: bearer secret"));
    }

    #[test]
    fn fetch_without_token_sends_no_authorization() {
        let (base, server) = serve_once("200 OK", r#"{"files":{"x":{"content":"[]"}}}"#);
        client_for(&base).fetch_document("abc", None).expect("fetch");
        let request = server.join().expect("server");
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[test]
    fn fetch_of_document_without_files_yields_none() {
        let (base, server) = serve_once("200 OK", r#"{"files":{}}"#);
        let content = client_for(&base).fetch_document("abc", None).expect("fetch");
        assert_eq!(content, None);
        server.join().expect("server");
    }

    #[test]
    fn fetch_maps_not_found_and_other_statuses() {
        let (base, server) = serve_once("404 Not Found", r#"{"message":"Not Found"}"#);
        let err = client_for(&base).fetch_document("missing", None).unwrap_err();
        assert!(matches!(err, SyncError::NotFound));
        server.join().expect("server");

        let (base, server) = serve_once("500 Internal Server Error", "{}");
        let err = client_for(&base).fetch_document("abc", None).unwrap_err();
        assert!(matches!(err, SyncError::Http { status: 500, .. }));
        server.join().expect("server");
    }

    #[test]
    fn fetch_reports_malformed_body_as_parse_error() {
        let (base, server) = serve_once("200 OK", "not json");
        let err = client_for(&base).fetch_document("abc", None).unwrap_err();
        assert!(matches!(err, SyncError::Parse(_)));
        server.join().expect("server");
    }

    #[test]
    fn save_patches_the_fixed_file() {
        let (base, server) = serve_once("200 OK", "{}");
        let client = client_for(&base);
        client
            .save_document("abc", "secret", "[\n  {}\n]")
            .expect("save");

        let request = server.join().expect("server");
        assert!(request.starts_with("PATCH /gists/abc HTTP/1.1"));
        let body = request.split("\r\n\r\n").nth(1).expect("body");
        let json: serde_json::Value = serde_json::from_str(body).expect("json body");
        assert_eq!(
            json["files"][client.file_name()]["content"],
            serde_json::Value::String("[\n  {}\n]".to_string())
        );
    }

    #[test]
    fn save_maps_conflict_and_auth_statuses() {
        let (base, server) = serve_once("409 Conflict", "{}");
        let err = client_for(&base).save_document("abc", "t", "[]").unwrap_err();
        assert!(matches!(err, SyncError::Conflict));
        server.join().expect("server");

        let (base, server) = serve_once("401 Unauthorized", "{}");
        let err = client_for(&base).save_document("abc", "t", "[]").unwrap_err();
        assert!(matches!(err, SyncError::Auth(401)));
        server.join().expect("server");

        let (base, server) = serve_once("422 Unprocessable Entity", "{}");
        let err = client_for(&base).save_document("abc", "t", "[]").unwrap_err();
        assert!(matches!(err, SyncError::Http { status: 422, .. }));
        server.join().expect("server");
    }
}
