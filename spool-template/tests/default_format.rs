//! The default format must always produce one parseable JSON object per line.

use spool_template::{DEFAULT_FORMAT, Field, LogRecord, Template};
use std::borrow::Cow;
use std::time::Duration;

fn sample() -> LogRecord<'static> {
    LogRecord {
        time_rfc3339: "2026-10-19T08:30:00+02:00".into(),
        remote_ip: Cow::Borrowed("192.168.1.1"),
        method: "POST",
        uri: "/api/users?page=2",
        path: "/api/users",
        status: 201,
        latency: Duration::from_micros(2_345),
        bytes_in: "17",
        bytes_out: 64,
        ..Default::default()
    }
}

#[test]
fn default_format_compiles() {
    let t = Template::compile(DEFAULT_FORMAT).unwrap();
    assert!(t.uses(Field::TimeRfc3339));
    assert!(t.uses(Field::BytesOut));
    assert!(!t.uses(Field::UserAgent));
    assert!(!t.uses_headers());
}

#[test]
fn default_format_renders_one_json_line() {
    let t = Template::compile(DEFAULT_FORMAT).unwrap();
    let mut buf = Vec::new();
    t.render(&sample(), &mut buf).unwrap();

    assert_eq!(buf.last(), Some(&b'\n'));
    assert_eq!(buf.iter().filter(|b| **b == b'\n').count(), 1);

    let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(v["time"], "2026-10-19T08:30:00+02:00");
    assert_eq!(v["remote_ip"], "192.168.1.1");
    assert_eq!(v["method"], "POST");
    assert_eq!(v["uri"], "/api/users?page=2");
    assert_eq!(v["status"], 201);
    assert_eq!(v["latency"], 2345);
    assert_eq!(v["latency_human"], "2.345ms");
    assert_eq!(v["bytes_in"], 17);
    assert_eq!(v["bytes_out"], 64);
}

#[test]
fn template_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Template>();
}
