//! Turns a router match into an HTTP-level decision
//!
//! The router only knows about one method's tree at a time. The dispatcher
//! layers the cross-method policies on top: trailing-slash redirects,
//! `OPTIONS` replies and `405 Method Not Allowed` with an `Allow` list.

use http::StatusCode;
use tracing::{debug, info};
use trellis_core::{MatchOutcome, Method, Params, Router};

/// Policy flags applied when a request has no direct match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Redirect to the path with its trailing slash toggled when only that
    /// variant is registered
    pub redirect_trailing_slash: bool,
    /// Answer 405 instead of 404 when another method matches the path
    pub handle_method_not_allowed: bool,
    /// Answer `OPTIONS` requests with the allowed method list
    pub handle_options: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            redirect_trailing_slash: true,
            handle_method_not_allowed: true,
            handle_options: true,
        }
    }
}

/// Allowed methods for a path, normalized for the `Allow` header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedMethods {
    methods: Vec<Method>,
}

impl AllowedMethods {
    /// Sorts into canonical order and de-duplicates
    pub fn new(mut methods: Vec<Method>) -> Self {
        methods.sort_unstable();
        methods.dedup();
        Self { methods }
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn contains(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Format as an HTTP Allow header value
    pub fn header_value(&self) -> String {
        let mut out = String::new();
        for (idx, method) in self.methods.iter().enumerate() {
            if idx > 0 {
                out.push_str(", ");
            }
            out.push_str(method.as_str());
        }
        out
    }
}

/// What the server should do with a request
#[derive(Debug)]
pub enum Resolution<'a, T> {
    /// Invoke the handler
    Handle {
        handler: &'a T,
        params: Params<'a>,
        route: &'a str,
    },
    /// Redirect to the same path with its trailing slash toggled
    Redirect { location: String, status: StatusCode },
    /// Reply to an `OPTIONS` request
    Options { allow: AllowedMethods },
    /// The path exists under other methods
    MethodNotAllowed { allow: AllowedMethods },
    NotFound,
}

impl<T> Resolution<'_, T> {
    /// Status code of the response this resolution leads to
    pub fn status(&self) -> StatusCode {
        match self {
            Resolution::Handle { .. } | Resolution::Options { .. } => StatusCode::OK,
            Resolution::Redirect { status, .. } => *status,
            Resolution::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Resolution::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Short name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Resolution::Handle { .. } => "handle",
            Resolution::Redirect { .. } => "redirect",
            Resolution::Options { .. } => "options",
            Resolution::MethodNotAllowed { .. } => "method_not_allowed",
            Resolution::NotFound => "not_found",
        }
    }
}

/// Read-only request dispatcher over a fully built router
pub struct Dispatcher<T> {
    router: Router<T>,
    options: DispatchOptions,
    /// Answer to `OPTIONS *`, fixed once the router is built
    global_allow: AllowedMethods,
}

impl<T> Dispatcher<T> {
    pub fn new(router: Router<T>, options: DispatchOptions) -> Self {
        let global_allow = AllowedMethods::new(router.allowed_methods("*", Method::OPTIONS));
        info!(
            routes = router.total_routes(),
            allow = %global_allow.header_value(),
            "dispatcher ready"
        );
        Self {
            router,
            options,
            global_allow,
        }
    }

    pub fn router(&self) -> &Router<T> {
        &self.router
    }

    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    /// Every method with at least one route, plus `OPTIONS`
    pub fn global_allow(&self) -> &AllowedMethods {
        &self.global_allow
    }

    /// Decide how to answer `method` on `path`
    pub fn resolve<'a>(&'a self, method: Method, path: &'a str) -> Resolution<'a, T> {
        let tsr = match self.router.lookup(method, path) {
            MatchOutcome::Matched {
                handler,
                params,
                route,
            } => {
                return Resolution::Handle {
                    handler,
                    params,
                    route,
                }
            }
            MatchOutcome::TrailingSlashRedirect => true,
            MatchOutcome::NoMatch => false,
        };

        if tsr && self.options.redirect_trailing_slash && method != Method::CONNECT && path != "/" {
            let location = toggle_trailing_slash(path);
            let status = if method == Method::GET {
                StatusCode::MOVED_PERMANENTLY
            } else {
                StatusCode::PERMANENT_REDIRECT
            };
            debug!(%method, path, %location, status = status.as_u16(), "trailing slash redirect");
            return Resolution::Redirect { location, status };
        }

        if method == Method::OPTIONS && self.options.handle_options {
            let allow = self.allowed(path, method);
            if !allow.is_empty() {
                return Resolution::Options { allow };
            }
        } else if self.options.handle_method_not_allowed {
            let allow = self.allowed(path, method);
            if !allow.is_empty() {
                debug!(%method, path, allow = %allow.header_value(), "method not allowed");
                return Resolution::MethodNotAllowed { allow };
            }
        }

        Resolution::NotFound
    }

    fn allowed(&self, path: &str, method: Method) -> AllowedMethods {
        if path == "*" {
            self.global_allow.clone()
        } else {
            AllowedMethods::new(self.router.allowed_methods(path, method))
        }
    }
}

fn toggle_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(trimmed) => trimmed.to_string(),
        None => format!("{}/", path),
    }
}
