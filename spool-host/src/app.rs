use http::Method;
use spool_core::handler::default_error_handler;
use spool_core::{Context, ErrorHandler, Gas, HandlerFunc, Request, SpoolError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Route table plus gas chain, assembled before serving.
///
/// Routing is exact-path only. Gases run in registration order: the first
/// one registered is the outermost.
pub struct App {
    routes: HashMap<String, HashMap<Method, HandlerFunc>>,
    gases: Vec<Gas>,
    error_handler: ErrorHandler,
}

impl App {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            gases: Vec::new(),
            error_handler: default_error_handler(),
        }
    }

    /// Register a handler for `method` + exact `path`.
    pub fn add(&mut self, method: Method, path: &str, handler: HandlerFunc) -> &mut Self {
        self.routes
            .entry(path.to_string())
            .or_default()
            .insert(method, handler);
        self
    }

    pub fn get(&mut self, path: &str, handler: HandlerFunc) -> &mut Self {
        self.add(Method::GET, path, handler)
    }

    pub fn post(&mut self, path: &str, handler: HandlerFunc) -> &mut Self {
        self.add(Method::POST, path, handler)
    }

    pub fn put(&mut self, path: &str, handler: HandlerFunc) -> &mut Self {
        self.add(Method::PUT, path, handler)
    }

    pub fn delete(&mut self, path: &str, handler: HandlerFunc) -> &mut Self {
        self.add(Method::DELETE, path, handler)
    }

    /// Append a gas. Earlier gases wrap later ones.
    pub fn gas(&mut self, gas: Gas) -> &mut Self {
        self.gases.push(gas);
        self
    }

    pub fn error_handler(&mut self, handler: ErrorHandler) -> &mut Self {
        self.error_handler = handler;
        self
    }

    /// Freeze routes and compose the gas chain once.
    pub fn build(self) -> Arc<Service> {
        let route_count = self.routes.values().map(|m| m.len()).sum::<usize>();
        let routes = self.routes;
        let router: HandlerFunc = Arc::new(move |ctx: &mut Context| {
            let Some(methods) = routes.get(ctx.request.path.as_str()) else {
                return Err(SpoolError::NotFound(ctx.request.path.clone()));
            };
            match methods.get(&ctx.request.method) {
                Some(handler) => handler(ctx),
                None => Err(SpoolError::MethodNotAllowed(format!(
                    "{} {}",
                    ctx.request.method, ctx.request.path
                ))),
            }
        });

        let chain = self.gases.iter().rev().fold(router, |next, gas| gas(next));
        debug!(routes = route_count, gases = self.gases.len(), "App built");

        Arc::new(Service {
            chain,
            error_handler: self.error_handler,
        })
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// A built app: one composed handler and the error handler.
pub struct Service {
    chain: HandlerFunc,
    error_handler: ErrorHandler,
}

impl Service {
    /// Context for `request`, wired to this app's error handler.
    pub fn context(&self, request: Request) -> Context {
        Context::new(request).with_error_handler(Arc::clone(&self.error_handler))
    }

    /// Run the chain. A returned error goes to the error handler, even if
    /// the response is already committed, unless a gas (the access logger)
    /// already handed it over through `Context::handle_error`.
    pub fn serve(&self, ctx: &mut Context) {
        if let Err(err) = (self.chain)(ctx) {
            debug!(error = %err, path = %ctx.request.path, "Handler error");
            if !ctx.error_handled() {
                ctx.handle_error(&err);
            }
        }
    }

    /// Build a context, serve it, and hand it back with the final response.
    pub fn handle(&self, request: Request) -> Context {
        let mut ctx = self.context(request);
        self.serve(&mut ctx);
        ctx
    }
}
