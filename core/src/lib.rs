//! # Trellis Core
//!
//! HTTP request router built on one compressed radix tree per method.
//!
//! ## Features
//! - Static, `:param` and `*catch_all` segments
//! - Zero-copy parameter capture (values borrow the request path)
//! - Children ordered by route count so busy branches are compared first
//! - Trailing-slash redirect signal on near misses
//! - All-or-nothing registration with explicit conflict errors
//!
//! ## Example
//! ```rust
//! use trellis_core::{MatchOutcome, Method, Router};
//!
//! let mut router = Router::new();
//! router.insert(Method::GET, "/users/:id", "get_user").unwrap();
//! router.insert(Method::POST, "/users", "create_user").unwrap();
//!
//! let (handler, params) = router.at(Method::GET, "/users/123").unwrap();
//! assert_eq!(handler, &"get_user");
//! assert_eq!(params.get("id"), Some("123"));
//!
//! assert!(matches!(
//!     router.lookup(Method::POST, "/users/"),
//!     MatchOutcome::TrailingSlashRedirect
//! ));
//! ```

use ahash::AHashMap;
use thiserror::Error;

pub mod method;
pub mod params;
pub mod path;
pub mod prettyprint;
pub mod radix;

pub use method::{Method, UnknownMethod};
pub use params::{Param, ParamError, Params};
pub use radix::{MatchResult, NodeKind, RadixTree};

/// Route registry with a separate tree per HTTP method
pub struct Router<T> {
    trees: AHashMap<Method, RadixTree<T>>,
}

/// Outcome of matching one request against one method's tree
#[derive(Debug)]
pub enum MatchOutcome<'a, T> {
    Matched {
        handler: &'a T,
        params: Params<'a>,
        /// Pattern the route was registered under
        route: &'a str,
    },
    /// The path would match with its trailing slash added or removed
    TrailingSlashRedirect,
    NoMatch,
}

impl<'a, T> From<MatchResult<'a, T>> for MatchOutcome<'a, T> {
    fn from(result: MatchResult<'a, T>) -> Self {
        match (result.handler, result.route) {
            (Some(handler), Some(route)) => MatchOutcome::Matched {
                handler,
                params: result.params,
                route,
            },
            _ if result.trailing_slash_redirect => MatchOutcome::TrailingSlashRedirect,
            _ => MatchOutcome::NoMatch,
        }
    }
}

impl<'a, T> MatchOutcome<'a, T> {
    #[inline]
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }
}

impl<T> Router<T> {
    /// Create a new router instance
    #[inline]
    pub fn new() -> Self {
        Self {
            trees: AHashMap::new(),
        }
    }

    /// Register `handler` for `method` and `pattern`
    ///
    /// A failed registration leaves the router unchanged.
    pub fn insert(&mut self, method: Method, pattern: &str, handler: T) -> Result<(), RouterError> {
        let tree = self.trees.entry(method).or_insert_with(RadixTree::new);
        tree.insert(pattern, handler)
    }

    /// Match `path` against the tree registered for `method`
    ///
    /// Never fails: a method without routes simply yields `NoMatch`.
    pub fn lookup<'a>(&'a self, method: Method, path: &'a str) -> MatchOutcome<'a, T> {
        match self.trees.get(&method) {
            Some(tree) => tree.lookup(path).into(),
            None => MatchOutcome::NoMatch,
        }
    }

    /// Find a route handler for the given method and path
    ///
    /// # Returns
    /// - `Some((handler, params))` if route found
    /// - `None` if no matching route
    #[inline]
    pub fn at<'a>(&'a self, method: Method, path: &'a str) -> Option<(&'a T, Params<'a>)> {
        self.trees.get(&method)?.find(path)
    }

    /// Methods other than `exclude` whose tree fully matches `path`
    ///
    /// `"*"` lists every method that has at least one route. OPTIONS is
    /// never looked up; it is appended whenever the list is non-empty. The
    /// result is in canonical method order.
    pub fn allowed_methods(&self, path: &str, exclude: Method) -> Vec<Method> {
        let mut allowed: Vec<Method> = Method::ALL
            .into_iter()
            .filter(|&method| method != Method::OPTIONS)
            .filter(|&method| {
                let Some(tree) = self.trees.get(&method) else {
                    return false;
                };
                if path == "*" {
                    !tree.is_empty()
                } else {
                    method != exclude && tree.find(path).is_some()
                }
            })
            .collect();

        if !allowed.is_empty() {
            allowed.push(Method::OPTIONS);
        }
        allowed
    }

    /// Capacity a parameter buffer needs for any route of `method`
    #[inline]
    pub fn max_params(&self, method: Method) -> usize {
        self.trees.get(&method).map_or(0, |tree| tree.max_params())
    }

    /// Get the number of routes for a specific method
    #[inline]
    pub fn len(&self, method: Method) -> usize {
        self.trees.get(&method).map_or(0, |tree| tree.len())
    }

    /// Check if router is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trees.values().all(|tree| tree.is_empty())
    }

    /// Get total number of routes across all methods
    pub fn total_routes(&self) -> usize {
        self.trees.values().map(|tree| tree.len()).sum()
    }

    /// Methods with a tree, in canonical order
    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        Method::ALL
            .into_iter()
            .filter(|method| self.trees.contains_key(method))
    }

    #[inline]
    pub fn tree(&self, method: Method) -> Option<&RadixTree<T>> {
        self.trees.get(&method)
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Route registration errors
///
/// Matching never fails, so these only surface from `insert`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Malformed pattern
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },
    /// New wildcard or static segment clashes with one already registered
    #[error("'{segment}' in new path '{pattern}' conflicts with existing prefix '{existing_prefix}'")]
    RouteConflict {
        segment: String,
        pattern: String,
        existing_prefix: String,
    },
    /// Same pattern registered twice for one method
    #[error("a handle is already registered for path '{pattern}'")]
    DuplicateRoute { pattern: String },
}
