use crate::error::SpoolError;
use crate::handler::{ErrorHandler, default_error_handler};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, REFERER, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;
use std::borrow::Cow;
use std::net::SocketAddr;

pub const HEADER_X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const HEADER_X_REAL_IP: &str = "x-real-ip";
pub const HEADER_X_REQUEST_ID: &str = "x-request-id";

/// Per-request state handed through the gas chain.
pub struct Context {
    pub request: Request,
    pub response: Response,
    /// Set by the host so gases can report errors the way the app would.
    error_handler: Option<ErrorHandler>,
    error_handled: bool,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: Response::new(),
            error_handler: None,
            error_handled: false,
        }
    }

    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Hand `err` to the host error handler (or the default one).
    ///
    /// The handler always runs, committed response or not; it decides what
    /// to do with a late error.
    pub fn handle_error(&mut self, err: &SpoolError) {
        let handler = self
            .error_handler
            .clone()
            .unwrap_or_else(default_error_handler);
        self.error_handled = true;
        handler(err, self);
    }

    /// Whether an error of this request already went through `handle_error`.
    pub fn error_handled(&self) -> bool {
        self.error_handled
    }
}

/// Inbound request as seen by handlers and gases.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub uri: Uri,
    /// Raw request path. Starts out as the URI path; gases may rewrite it.
    pub path: String,
    pub headers: HeaderMap,
    /// Peer address of the connection, when the host knows it.
    pub remote_addr: Option<SocketAddr>,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, uri: Uri) -> Self {
        let path = uri.path().to_string();
        Self {
            method,
            uri,
            path,
            headers: HeaderMap::new(),
            remote_addr: None,
            body: Bytes::new(),
        }
    }

    /// Add a header, builder style. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Get a request header (case-insensitive). Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Client IP: first `X-Forwarded-For` hop, then `X-Real-Ip`, then the peer.
    pub fn remote_ip(&self) -> Cow<'_, str> {
        if let Some(xff) = self.header(HEADER_X_FORWARDED_FOR) {
            let first = xff.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                return Cow::Borrowed(first);
            }
        }
        if let Some(real) = self.header(HEADER_X_REAL_IP) {
            let real = real.trim();
            if !real.is_empty() {
                return Cow::Borrowed(real);
            }
        }
        match self.remote_addr {
            Some(addr) => Cow::Owned(addr.ip().to_string()),
            None => Cow::Borrowed(""),
        }
    }

    /// `Host` header, falling back to the URI authority.
    pub fn host(&self) -> &str {
        self.header(HOST.as_str())
            .or_else(|| self.uri.authority().map(|a| a.as_str()))
            .unwrap_or("")
    }

    /// Path and query exactly as requested.
    pub fn request_uri(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or(self.path.as_str())
    }

    pub fn referer(&self) -> &str {
        self.header(REFERER.as_str()).unwrap_or("")
    }

    pub fn user_agent(&self) -> &str {
        self.header(USER_AGENT.as_str()).unwrap_or("")
    }
}

/// Outbound response being assembled by the handler chain.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Body bytes written so far.
    pub size: u64,
    /// Set once the status line is fixed; later status changes are ignored.
    pub committed: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body: Vec::new(),
            size: 0,
            committed: false,
        }
    }

    /// Fix the status code. A second call is a no-op.
    pub fn write_header(&mut self, status: u16) {
        if self.committed {
            tracing::debug!(status, current = self.status, "Response already committed");
            return;
        }
        self.status = status;
        self.committed = true;
    }

    /// Append body bytes, committing the current status first.
    pub fn write(&mut self, data: &[u8]) {
        self.committed = true;
        self.body.extend_from_slice(data);
        self.size += data.len() as u64;
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Get a response header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn string(&mut self, status: u16, body: &str) {
        self.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        self.write_header(status);
        self.write(body.as_bytes());
    }

    pub fn json<T: Serialize>(&mut self, status: u16, value: &T) -> Result<(), SpoolError> {
        let body = serde_json::to_vec(value)?;
        self.json_bytes(status, &body);
        Ok(())
    }

    /// Write an already-encoded JSON body.
    pub fn json_bytes(&mut self, status: u16, body: &[u8]) {
        self.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.write_header(status);
        self.write(body);
    }

    pub fn no_content(&mut self, status: u16) {
        self.write_header(status);
    }
}
