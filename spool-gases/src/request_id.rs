//! Request ID gas: makes sure every response carries an `X-Request-Id`.
//!
//! An incoming ID is echoed back; otherwise a new one is generated. The
//! logger picks it up through the `id` field.

use http::HeaderValue;
use http::header::HeaderName;
use spool_core::context::HEADER_X_REQUEST_ID;
use spool_core::handler::default_skipper;
use spool_core::{Context, Gas, HandlerFunc, Skipper};
use std::sync::Arc;

pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct RequestIdConfig {
    pub skipper: Skipper,
    pub generator: IdGenerator,
}

impl Default for RequestIdConfig {
    fn default() -> Self {
        Self {
            skipper: default_skipper(),
            generator: Arc::new(|| uuid::Uuid::new_v4().to_string()),
        }
    }
}

pub fn request_id() -> Gas {
    request_id_with_config(RequestIdConfig::default())
}

pub fn request_id_with_config(config: RequestIdConfig) -> Gas {
    let config = Arc::new(config);
    Arc::new(move |next: HandlerFunc| -> HandlerFunc {
        let config = Arc::clone(&config);
        Arc::new(move |ctx: &mut Context| {
            if (config.skipper)(ctx) {
                return next(ctx);
            }
            let incoming = ctx
                .request
                .headers
                .get(HEADER_X_REQUEST_ID)
                .filter(|v| !v.is_empty())
                .cloned();
            let id = match incoming {
                Some(v) => Some(v),
                None => HeaderValue::from_str(&(config.generator)()).ok(),
            };
            if let Some(id) = id {
                ctx.response
                    .set_header(HeaderName::from_static(HEADER_X_REQUEST_ID), id);
            }
            next(ctx)
        })
    })
}
