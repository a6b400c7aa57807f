use chrono::{Local, SecondsFormat};
use http::header::CONTENT_LENGTH;
use spool_core::Context;
use spool_core::context::HEADER_X_REQUEST_ID;
use spool_template::{Field, LogRecord, Template};
use std::time::Duration;

/// Collect the line's values from the finished request.
///
/// `time_rfc3339` is the wall clock now, at render, not at request start.
/// It is only formatted when the template asks for it.
pub fn build_record<'a>(
    template: &Template,
    ctx: &'a Context,
    latency: Duration,
) -> LogRecord<'a> {
    let req = &ctx.request;
    let res = &ctx.response;

    let time_rfc3339 = if template.uses(Field::TimeRfc3339) {
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    } else {
        String::new()
    };

    let path = if req.path.is_empty() { "/" } else { req.path.as_str() };

    LogRecord {
        time_rfc3339,
        id: req
            .header(HEADER_X_REQUEST_ID)
            .or_else(|| res.header(HEADER_X_REQUEST_ID))
            .unwrap_or(""),
        remote_ip: req.remote_ip(),
        host: req.host(),
        uri: req.request_uri(),
        method: req.method.as_str(),
        path,
        referer: req.referer(),
        user_agent: req.user_agent(),
        status: res.status,
        latency,
        bytes_in: req.header(CONTENT_LENGTH.as_str()).unwrap_or("0"),
        bytes_out: res.size,
        headers: template.uses_headers().then_some(&req.headers),
    }
}
