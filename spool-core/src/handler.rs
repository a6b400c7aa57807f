//! Handler, gas, and error-handler signatures shared by the host and gases.

use crate::context::Context;
use crate::error::SpoolError;
use std::sync::Arc;

/// A request handler. Errors are reported to the host error handler.
pub type HandlerFunc = Arc<dyn Fn(&mut Context) -> Result<(), SpoolError> + Send + Sync>;

/// Middleware: wraps the next handler and returns the wrapped one.
pub type Gas = Arc<dyn Fn(HandlerFunc) -> HandlerFunc + Send + Sync>;

/// Turns a handler error into a response.
pub type ErrorHandler = Arc<dyn Fn(&SpoolError, &mut Context) + Send + Sync>;

/// Decides whether a gas should pass the request straight through.
pub type Skipper = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Never skip.
pub fn default_skipper() -> Skipper {
    Arc::new(|_: &Context| false)
}

/// Respond with the error's status and JSON body, unless a response is
/// already committed. Safe to call more than once per request.
pub fn default_error_handler() -> ErrorHandler {
    Arc::new(|err: &SpoolError, ctx: &mut Context| {
        if ctx.response.committed {
            return;
        }
        ctx.response.json_bytes(err.status_code(), &err.to_json_body());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Request;
    use http::{Method, Uri};

    fn ctx() -> Context {
        Context::new(Request::new(Method::GET, Uri::from_static("/")))
    }

    #[test]
    fn default_skipper_never_skips() {
        let skip = default_skipper();
        assert!(!skip(&ctx()));
    }

    #[test]
    fn default_error_handler_writes_status_and_body() {
        let handler = default_error_handler();
        let mut ctx = ctx();
        handler(&SpoolError::NotFound("/nope".into()), &mut ctx);
        assert_eq!(ctx.response.status, 404);
        let v: serde_json::Value = serde_json::from_slice(&ctx.response.body).unwrap();
        assert_eq!(v["status"], 404);
    }

    #[test]
    fn default_error_handler_is_idempotent() {
        let handler = default_error_handler();
        let mut ctx = ctx();
        let err = SpoolError::http(502, "upstream");
        handler(&err, &mut ctx);
        let size = ctx.response.size;
        handler(&err, &mut ctx);
        assert_eq!(ctx.response.status, 502);
        assert_eq!(ctx.response.size, size);
    }

    #[test]
    fn default_error_handler_leaves_committed_response() {
        let handler = default_error_handler();
        let mut ctx = ctx();
        ctx.response.string(200, "partial");
        handler(&SpoolError::Internal("late".into()), &mut ctx);
        assert_eq!(ctx.response.status, 200);
        assert_eq!(ctx.response.body, b"partial");
    }
}
