//! Route table configuration
//!
//! A JSON file lists the routes to register and the dispatch policy flags:
//!
//! ```json
//! {
//!   "redirect_trailing_slash": true,
//!   "routes": [
//!     { "method": "GET", "path": "/users/:id", "handler_id": "get_user" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trellis_core::{Method, Router};

use crate::dispatch::{DispatchOptions, Dispatcher};
use crate::error::{TrellisError, TrellisResult};

/// Complete router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Redirect when only the other trailing-slash variant is registered
    #[serde(default = "default_true")]
    pub redirect_trailing_slash: bool,

    /// Answer 405 with an Allow list when another method matches
    #[serde(default = "default_true")]
    pub handle_method_not_allowed: bool,

    /// Answer OPTIONS requests automatically
    #[serde(default = "default_true")]
    pub handle_options: bool,

    /// Route configurations
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Route configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// HTTP method: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS
    pub method: String,

    /// URL path pattern: /api/users/:id
    pub path: String,

    /// Handler ID returned when the route matches
    pub handler_id: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            redirect_trailing_slash: true,
            handle_method_not_allowed: true,
            handle_options: true,
            routes: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> TrellisResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrellisError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config = Self::from_json_str(&content)?;
        info!(path = %path.display(), routes = config.routes.len(), "configuration loaded");
        Ok(config)
    }

    /// Parse configuration from JSON text
    pub fn from_json_str(json: &str) -> TrellisResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TrellisError::Config(format!("Failed to parse config JSON: {}", e)))
    }

    /// Validate configuration
    ///
    /// Only checks what can be decided per route; conflicts between routes
    /// are reported by [`RouterConfig::build_dispatcher`].
    pub fn validate(&self) -> TrellisResult<()> {
        for (idx, route) in self.routes.iter().enumerate() {
            route
                .method
                .parse::<Method>()
                .map_err(|e| TrellisError::Config(format!("Route {}: {}", idx, e)))?;
            if route.handler_id.is_empty() {
                return Err(TrellisError::Config(format!(
                    "Route {} ({} {}): handler id cannot be empty",
                    idx, route.method, route.path
                )));
            }
            if !route.path.starts_with('/') {
                return Err(TrellisError::Config(format!(
                    "Route {}: path '{}' must begin with '/'",
                    idx, route.path
                )));
            }
        }
        Ok(())
    }

    /// Dispatch flags carried by this configuration
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            redirect_trailing_slash: self.redirect_trailing_slash,
            handle_method_not_allowed: self.handle_method_not_allowed,
            handle_options: self.handle_options,
        }
    }

    /// Register every route, stopping at the first registration error
    pub fn build_dispatcher(&self) -> TrellisResult<Dispatcher<String>> {
        self.validate()?;

        let mut router = Router::new();
        for route in &self.routes {
            let method: Method = route
                .method
                .parse()
                .map_err(|e| TrellisError::Config(format!("{}", e)))?;
            router.insert(method, &route.path, route.handler_id.clone())?;
            debug!(%method, path = %route.path, handler = %route.handler_id, "route registered");
        }

        Ok(Dispatcher::new(router, self.dispatch_options()))
    }
}

fn default_true() -> bool {
    true
}
