//! # Trellis
//!
//! Route tables, request dispatch and parameter buffers on top of
//! [`trellis_core`].
//!
//! ## Features
//! - JSON route tables with per-route validation
//! - Trailing-slash redirects (301 for GET, 308 otherwise)
//! - Automatic `OPTIONS` replies and `405` with an `Allow` list
//! - Pooled owned parameter buffers that survive handler panics
//!
//! ## Quick Start
//!
//! ```rust
//! use trellis_server::{Method, Resolution, RouterConfig};
//!
//! let config = RouterConfig::from_json_str(r#"{
//!     "routes": [
//!         { "method": "GET", "path": "/users/:id", "handler_id": "get_user" },
//!         { "method": "POST", "path": "/users/", "handler_id": "create_user" }
//!     ]
//! }"#).unwrap();
//! let dispatcher = config.build_dispatcher().unwrap();
//!
//! match dispatcher.resolve(Method::GET, "/users/42") {
//!     Resolution::Handle { handler, params, .. } => {
//!         assert_eq!(handler, "get_user");
//!         assert_eq!(params.get("id"), Some("42"));
//!     }
//!     other => panic!("unexpected: {:?}", other),
//! }
//!
//! let redirect = dispatcher.resolve(Method::POST, "/users");
//! assert_eq!(redirect.status(), http::StatusCode::PERMANENT_REDIRECT);
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod pool;

pub use config::{RouteConfig, RouterConfig};
pub use dispatch::{AllowedMethods, DispatchOptions, Dispatcher, Resolution};
pub use error::{TrellisError, TrellisResult};
pub use pool::{ParamsPool, PooledParams};
pub use trellis_core::{MatchOutcome, Method, Params, Router, RouterError};
