use crate::duration::HumanDuration;
use crate::field::Field;
use crate::record::LogRecord;
use http::HeaderName;
use spool_core::SpoolError;
use spool_core::config::MissingField;
use std::io::Write;

/// Default format: one JSON object per line.
pub const DEFAULT_FORMAT: &str = concat!(
    r#"{"time":"{{.time_rfc3339}}","remote_ip":"{{.remote_ip}}","#,
    r#""method":"{{.method}}","uri":"{{.uri}}","status":{{.status}},"#,
    r#""latency":{{.latency}},"latency_human":"{{.latency_human}}","#,
    r#""bytes_in":{{.bytes_in}},"bytes_out":{{.bytes_out}}}"#,
    "\n",
);

/// One piece of a compiled format.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
    Header(HeaderName),
}

/// A compiled access log format.
///
/// Compiled once at setup; immutable and shared by every request.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
    missing_field: MissingField,
}

impl Template {
    /// Compile a format string of literal text and `{{.field}}` actions.
    ///
    /// `{{.header:Name}}` looks up a request header. Whitespace inside the
    /// braces is ignored.
    pub fn compile(format: &str) -> Result<Self, SpoolError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut pos = 0;

        while let Some(open) = format[pos..].find("{{") {
            let action_start = pos + open;
            literal.push_str(&format[pos..action_start]);

            let body_start = action_start + 2;
            let close = format[body_start..].find("}}").ok_or_else(|| SpoolError::InvalidFormat {
                offset: action_start,
                reason: "unterminated action, expected \"}}\"".into(),
            })?;
            let action = format[body_start..body_start + close].trim();
            let segment = parse_action(action).map_err(|reason| SpoolError::InvalidFormat {
                offset: action_start,
                reason,
            })?;

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
            pos = body_start + close + 2;
        }

        literal.push_str(&format[pos..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: format.to_string(),
            segments,
            missing_field: MissingField::default(),
        })
    }

    /// Set what absent `header:` values do at render time.
    pub fn with_missing_field(mut self, policy: MissingField) -> Self {
        self.missing_field = policy;
        self
    }

    /// The format string this template was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the format references `field`.
    pub fn uses(&self, field: Field) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Field(f) if *f == field))
    }

    /// Whether the format has any `header:` placeholder.
    pub fn uses_headers(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Header(_)))
    }

    /// Write the record into `out`, segment by segment, without escaping.
    ///
    /// On error `out` may hold a partial line; callers discard it.
    pub fn render<W: Write>(&self, record: &LogRecord<'_>, out: &mut W) -> Result<(), SpoolError> {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.write_all(text.as_bytes())?,
                Segment::Field(field) => write_field(*field, record, out)?,
                Segment::Header(name) => {
                    let value = record
                        .headers
                        .and_then(|h| h.get(name))
                        .and_then(|v| v.to_str().ok());
                    match (value, self.missing_field) {
                        (Some(v), _) => out.write_all(v.as_bytes())?,
                        (None, MissingField::Empty) => {}
                        (None, MissingField::Error) => {
                            return Err(SpoolError::Render(format!(
                                "missing value for header:{}",
                                name.as_str()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_action(action: &str) -> Result<Segment, String> {
    if action.is_empty() {
        return Err("empty action".into());
    }
    let Some(name) = action.strip_prefix('.') else {
        return Err(format!("expected \".field\", found {action:?}"));
    };
    if let Some(header) = name.strip_prefix("header:") {
        return HeaderName::from_bytes(header.trim().as_bytes())
            .map(Segment::Header)
            .map_err(|_| format!("invalid header name {header:?}"));
    }
    Field::from_name(name)
        .map(Segment::Field)
        .ok_or_else(|| format!("unknown field {name:?}"))
}

fn write_field<W: Write>(field: Field, r: &LogRecord<'_>, out: &mut W) -> std::io::Result<()> {
    let mut num = itoa::Buffer::new();
    match field {
        Field::TimeRfc3339 => out.write_all(r.time_rfc3339.as_bytes()),
        Field::Id => out.write_all(r.id.as_bytes()),
        Field::RemoteIp => out.write_all(r.remote_ip.as_bytes()),
        Field::Host => out.write_all(r.host.as_bytes()),
        Field::Uri => out.write_all(r.uri.as_bytes()),
        Field::Method => out.write_all(r.method.as_bytes()),
        Field::Path => out.write_all(r.path.as_bytes()),
        Field::Referer => out.write_all(r.referer.as_bytes()),
        Field::UserAgent => out.write_all(r.user_agent.as_bytes()),
        Field::Status => out.write_all(num.format(r.status).as_bytes()),
        Field::Latency => out.write_all(num.format(r.latency.as_micros()).as_bytes()),
        Field::LatencyHuman => write!(out, "{}", HumanDuration(r.latency)),
        Field::BytesIn => out.write_all(r.bytes_in.as_bytes()),
        Field::BytesOut => out.write_all(num.format(r.bytes_out).as_bytes()),
    }
}
