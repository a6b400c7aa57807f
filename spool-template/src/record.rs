use http::HeaderMap;
use std::borrow::Cow;
use std::time::Duration;

/// Values for one access log line, borrowed from the request context.
///
/// Built after the wrapped handler returns and dropped right after render.
#[derive(Debug, Clone, Default)]
pub struct LogRecord<'a> {
    pub time_rfc3339: String,
    pub id: &'a str,
    pub remote_ip: Cow<'a, str>,
    pub host: &'a str,
    pub uri: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    pub referer: &'a str,
    pub user_agent: &'a str,
    pub status: u16,
    pub latency: Duration,
    pub bytes_in: &'a str,
    pub bytes_out: u64,
    /// Request headers for `header:` placeholders.
    pub headers: Option<&'a HeaderMap>,
}
