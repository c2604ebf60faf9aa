//! A minimal HTTP/1.1 static file responder: GET/HEAD only, no keep-alive,
//! no range requests, no CGI (see Non-goals).

use super::Service;
use crate::stats::RequestStats;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Head,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum RequestError {
    #[error("malformed request line")]
    MalformedRequestLine,
    #[error("unsupported method {0:?}")]
    UnsupportedMethod(String),
    #[error("path escapes the document root")]
    PathTraversal,
    #[error("connection closed before a full request line arrived")]
    ConnectionClosed,
}

/// Serves files beneath a fixed document root over plain HTTP/1.1.
pub struct StaticFileService {
    doc_root: PathBuf,
    read_timeout: Duration,
}

impl StaticFileService {
    pub fn new(doc_root: PathBuf, read_timeout: Duration) -> Self {
        Self {
            doc_root,
            read_timeout,
        }
    }

    /// Resolve a request path (as it appeared on the wire, e.g. `/a/b.txt`)
    /// to a filesystem path beneath `doc_root`, rejecting any attempt to
    /// escape it via `..` components.
    fn resolve(&self, request_path: &str) -> Result<PathBuf, RequestError> {
        let request_path = request_path.split('?').next().unwrap_or(request_path);
        let relative = request_path.trim_start_matches('/');
        let relative = if relative.is_empty() { "index.html" } else { relative };

        let mut resolved = self.doc_root.clone();
        for component in Path::new(relative).components() {
            use std::path::Component;
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(RequestError::PathTraversal);
                }
            }
        }
        Ok(resolved)
    }

    fn read_request_line(&self, stream: &TcpStream) -> Result<(Method, String), RequestError> {
        stream.set_read_timeout(Some(self.read_timeout)).ok();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let n = reader
            .read_line(&mut line)
            .map_err(|_| RequestError::ConnectionClosed)?;
        if n == 0 {
            return Err(RequestError::ConnectionClosed);
        }

        let line = line.trim_end();
        let mut parts = line.split_whitespace();
        let method = parts.next().ok_or(RequestError::MalformedRequestLine)?;
        let path = parts.next().ok_or(RequestError::MalformedRequestLine)?;
        let _version = parts.next().ok_or(RequestError::MalformedRequestLine)?;

        // Drain the rest of the headers up to the blank line; their
        // contents don't affect a static GET/HEAD response.
        loop {
            let mut header_line = String::new();
            match reader.read_line(&mut header_line) {
                Ok(0) | Err(_) => break,
                Ok(_) if header_line.trim_end().is_empty() => break,
                Ok(_) => continue,
            }
        }

        let method = match method {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            other => return Err(RequestError::UnsupportedMethod(other.to_string())),
        };

        Ok((method, path.to_string()))
    }
}

impl Service for StaticFileService {
    fn serve(&self, stream: &TcpStream, stats: &RequestStats) {
        let outcome = self.handle(stream);
        match outcome {
            Ok(status) => debug!(
                thread_id = stats.thread_id,
                dispatch_time = ?stats.dispatch_time,
                status,
                "served request"
            ),
            Err(e) => debug!(
                thread_id = stats.thread_id,
                dispatch_time = ?stats.dispatch_time,
                error = %e,
                "request error"
            ),
        }
    }
}

impl StaticFileService {
    fn handle(&self, stream: &TcpStream) -> Result<u16, RequestError> {
        let (method, path) = self.read_request_line(stream)?;

        match self.resolve(&path) {
            Err(e @ RequestError::PathTraversal) => {
                write_status_only(stream, 400, "Bad Request");
                Err(e)
            }
            Ok(resolved) => {
                let body = std::fs::read(&resolved).ok();
                match body {
                    Some(bytes) => {
                        write_response(stream, 200, "OK", &bytes, method == Method::Head);
                        Ok(200)
                    }
                    None => {
                        write_status_only(stream, 404, "Not Found");
                        Ok(404)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }
}

fn write_response(mut stream: &TcpStream, status: u16, reason: &str, body: &[u8], head_only: bool) {
    let header = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    if let Err(e) = stream.write_all(header.as_bytes()) {
        warn!(error = %e, "failed writing response header");
        return;
    }
    if !head_only {
        if let Err(e) = stream.write_all(body) {
            warn!(error = %e, "failed writing response body");
        }
    }
}

fn write_status_only(stream: &TcpStream, status: u16, reason: &str) {
    write_response(stream, status, reason, &[], false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{TcpListener, TcpStream};
    use std::time::Instant;

    fn stats() -> RequestStats {
        RequestStats {
            thread_id: 0,
            arrival_time: Instant::now(),
            dispatch_time: Duration::from_millis(0),
        }
    }

    fn request(service: &StaticFileService, raw: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).unwrap();
        let (server_side, _) = listener.accept().unwrap();

        client.write_all(raw.as_bytes()).unwrap();

        service.serve(&server_side, &stats());
        drop(server_side);

        let mut response = Vec::new();
        client.read_to_end(&mut response).unwrap();
        String::from_utf8_lossy(&response).to_string()
    }

    #[test]
    fn serves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"hi there").unwrap();
        let service = StaticFileService::new(dir.path().to_path_buf(), Duration::from_secs(1));

        let response = request(&service, "GET /hello.txt HTTP/1.1\r\n\r\n");
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("Content-Length: 8"));
        assert!(response.ends_with("hi there"));
    }

    #[test]
    fn missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let service = StaticFileService::new(dir.path().to_path_buf(), Duration::from_secs(1));

        let response = request(&service, "GET /nope.txt HTTP/1.1\r\n\r\n");
        assert!(response.starts_with("HTTP/1.1 404 Not Found"));
    }

    #[test]
    fn path_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = StaticFileService::new(dir.path().to_path_buf(), Duration::from_secs(1));

        let response = request(&service, "GET /../secret HTTP/1.1\r\n\r\n");
        assert!(response.starts_with("HTTP/1.1 400 Bad Request"));
    }

    #[test]
    fn head_request_has_no_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"content").unwrap();
        let service = StaticFileService::new(dir.path().to_path_buf(), Duration::from_secs(1));

        let response = request(&service, "HEAD /a.txt HTTP/1.1\r\n\r\n");
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("\r\n\r\n"));
    }

    #[test]
    fn resolve_defaults_empty_path_to_index() {
        let dir = tempfile::tempdir().unwrap();
        let service = StaticFileService::new(dir.path().to_path_buf(), Duration::from_secs(1));
        let resolved = service.resolve("/").unwrap();
        assert_eq!(resolved, dir.path().join("index.html"));
    }

    #[test]
    fn resolve_rejects_parent_dir_components() {
        let dir = tempfile::tempdir().unwrap();
        let service = StaticFileService::new(dir.path().to_path_buf(), Duration::from_secs(1));
        assert_eq!(service.resolve("/../etc/passwd"), Err(RequestError::PathTraversal));
    }

    #[test]
    fn unsupported_method_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let service = StaticFileService::new(dir.path().to_path_buf(), Duration::from_secs(1));
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        client.write_all(b"DELETE /x HTTP/1.1\r\n\r\n").unwrap();

        let result = service.handle(&server_side);
        assert!(matches!(result, Err(RequestError::UnsupportedMethod(_))));
        drop(client);
    }
}
