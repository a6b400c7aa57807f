/// The closed set of values an access log line can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Wall-clock time at render, RFC 3339.
    TimeRfc3339,
    /// `X-Request-Id` of the request, else of the response.
    Id,
    RemoteIp,
    Host,
    /// Path and query as requested.
    Uri,
    Method,
    /// Request path, `/` when empty.
    Path,
    Referer,
    UserAgent,
    Status,
    /// Whole microseconds spent in the wrapped handler.
    Latency,
    LatencyHuman,
    /// `Content-Length` of the request, `0` when absent.
    BytesIn,
    BytesOut,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::TimeRfc3339 => "time_rfc3339",
            Field::Id => "id",
            Field::RemoteIp => "remote_ip",
            Field::Host => "host",
            Field::Uri => "uri",
            Field::Method => "method",
            Field::Path => "path",
            Field::Referer => "referer",
            Field::UserAgent => "user_agent",
            Field::Status => "status",
            Field::Latency => "latency",
            Field::LatencyHuman => "latency_human",
            Field::BytesIn => "bytes_in",
            Field::BytesOut => "bytes_out",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::all().iter().copied().find(|f| f.as_str() == name)
    }

    pub fn all() -> &'static [Field] {
        &[
            Field::TimeRfc3339,
            Field::Id,
            Field::RemoteIp,
            Field::Host,
            Field::Uri,
            Field::Method,
            Field::Path,
            Field::Referer,
            Field::UserAgent,
            Field::Status,
            Field::Latency,
            Field::LatencyHuman,
            Field::BytesIn,
            Field::BytesOut,
        ]
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
