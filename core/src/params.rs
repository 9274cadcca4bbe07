//! Zero-copy route parameter extraction

use thiserror::Error;

/// A single captured path parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param<'a> {
    /// Wildcard name without its sigil
    pub key: &'a str,
    /// Captured text from the request path
    pub value: &'a str,
}

/// Zero-copy route parameters container
///
/// Keys borrow from the tree, values borrow from the request path. Entries
/// keep path order (left to right), which is also the order wildcards were
/// walked during matching. Routes rarely carry more than a handful of
/// parameters, so a linear scan beats hashing here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'a> {
    inner: Vec<Param<'a>>,
}

impl<'a> Params<'a> {
    /// Create new empty parameters container
    #[inline]
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Create with pre-allocated capacity for known parameter count
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Append a parameter (internal use only)
    #[inline]
    pub(crate) fn push(&mut self, key: &'a str, value: &'a str) {
        self.inner.push(Param { key, value });
    }

    /// Get the value of the first parameter named `name`
    #[inline]
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.inner.iter().find(|p| p.key == name).map(|p| p.value)
    }

    /// Check if parameter exists
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|p| p.key == name)
    }

    /// Get parameter count
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if parameters are empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over all parameters in path order
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&'a str, &'a str)> + '_ {
        self.inner.iter().map(|p| (p.key, p.value))
    }

    /// Borrow the parameters as a slice
    #[inline]
    pub fn as_slice(&self) -> &[Param<'a>] {
        &self.inner
    }

    /// Parse parameter as specific type
    pub fn parse<T>(&self, name: &str) -> Result<T, ParamError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self
            .get(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))?;
        value.parse::<T>().map_err(|e| ParamError::Parse {
            name: name.to_string(),
            value: value.to_string(),
            error: e.to_string(),
        })
    }

    /// Get parameter as u64 (common case optimization)
    #[inline]
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name)?.parse().ok()
    }

    /// Get parameter as i64 (common case optimization)
    #[inline]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.parse().ok()
    }
}

impl<'a> IntoIterator for Params<'a> {
    type Item = Param<'a>;
    type IntoIter = std::vec::IntoIter<Param<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// Parameter parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// Parameter not found
    #[error("Parameter '{0}' not found")]
    Missing(String),
    /// Parameter parsing failed
    #[error("Failed to parse parameter '{name}' with value '{value}': {error}")]
    Parse {
        name: String,
        value: String,
        error: String,
    },
}
