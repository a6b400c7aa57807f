//! Ready-made skip predicates.

use regex::RegexSet;
use spool_core::{Context, Skipper, SpoolError};
use std::collections::HashSet;
use std::sync::Arc;

/// Skip requests whose path is exactly one of `paths`.
pub fn skip_paths<I, S>(paths: I) -> Skipper
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let paths: HashSet<String> = paths.into_iter().map(Into::into).collect();
    Arc::new(move |ctx: &Context| paths.contains(ctx.request.path.as_str()))
}

/// Skip requests whose path matches any of the regex `patterns`.
pub fn skip_patterns(patterns: &[String]) -> Result<Skipper, SpoolError> {
    let set = RegexSet::new(patterns)
        .map_err(|e| SpoolError::ConfigError(format!("invalid skip pattern: {e}")))?;
    Ok(Arc::new(move |ctx: &Context| set.is_match(&ctx.request.path)))
}

/// Skip when any of `skippers` says so.
pub fn any_of(skippers: Vec<Skipper>) -> Skipper {
    Arc::new(move |ctx: &Context| skippers.iter().any(|skip| skip(ctx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, Uri};
    use spool_core::Request;

    fn ctx(path: &'static str) -> Context {
        Context::new(Request::new(Method::GET, Uri::from_static(path)))
    }

    #[test]
    fn skip_paths_matches_exactly() {
        let skip = skip_paths(["/health", "/metrics"]);
        assert!(skip(&ctx("/health")));
        assert!(skip(&ctx("/metrics")));
        assert!(!skip(&ctx("/health/deep")));
        assert!(!skip(&ctx("/")));
    }

    #[test]
    fn skip_patterns_uses_regex() {
        let skip = skip_patterns(&[r"^/assets/".to_string(), r"\.ico$".to_string()]).unwrap();
        assert!(skip(&ctx("/assets/app.js")));
        assert!(skip(&ctx("/favicon.ico")));
        assert!(!skip(&ctx("/api/assets")));
    }

    #[test]
    fn skip_patterns_rejects_bad_regex() {
        let err = skip_patterns(&["(".to_string()]).err().unwrap();
        assert!(matches!(err, SpoolError::ConfigError(_)));
    }

    #[test]
    fn empty_pattern_list_never_skips() {
        let skip = skip_patterns(&[]).unwrap();
        assert!(!skip(&ctx("/anything")));
    }

    #[test]
    fn any_of_combines() {
        let skip = any_of(vec![
            skip_paths(["/health"]),
            skip_patterns(&[r"^/internal".to_string()]).unwrap(),
        ]);
        assert!(skip(&ctx("/health")));
        assert!(skip(&ctx("/internal/debug")));
        assert!(!skip(&ctx("/public")));
    }
}
