//! Reusable owned parameter buffers
//!
//! Matching hands back [`Params`] that borrow the request path. A server that
//! needs the values past the lifetime of that borrow copies them into a
//! pooled buffer, which keeps its string allocations between requests.

use std::sync::{Mutex, PoisonError};

use trellis_core::{Method, Params, Router};

/// Owned key/value storage; entries past `len` are spare allocations
#[derive(Debug, Default)]
struct ParamBuffer {
    entries: Vec<(String, String)>,
    len: usize,
}

impl ParamBuffer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    fn clear(&mut self) {
        for (key, value) in &mut self.entries[..self.len] {
            key.clear();
            value.clear();
        }
        self.len = 0;
    }
}

/// Pool of parameter buffers sized for a router's largest route
#[derive(Debug)]
pub struct ParamsPool {
    idle: Mutex<Vec<ParamBuffer>>,
    capacity: usize,
}

impl ParamsPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Size buffers to the largest parameter count of any method's routes
    pub fn for_router<T>(router: &Router<T>) -> Self {
        let capacity = Method::ALL
            .into_iter()
            .map(|method| router.max_params(method))
            .max()
            .unwrap_or(0);
        Self::new(capacity)
    }

    /// Parameter slots each fresh buffer is allocated with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Take a buffer; it goes back to the pool when the guard drops
    pub fn acquire(&self) -> PooledParams<'_> {
        let buffer = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| ParamBuffer::with_capacity(self.capacity));
        PooledParams { pool: self, buffer }
    }

    /// Buffers currently idle in the pool
    pub fn available(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn release(&self, mut buffer: ParamBuffer) {
        buffer.clear();
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(buffer);
    }
}

/// A RAII guard over a pooled parameter buffer.
///
/// Returned to its pool on drop, including while unwinding out of a handler.
#[derive(Debug)]
pub struct PooledParams<'p> {
    pool: &'p ParamsPool,
    buffer: ParamBuffer,
}

impl PooledParams<'_> {
    /// Replace the contents with `params`, reusing existing allocations
    pub fn fill(&mut self, params: &Params<'_>) {
        let buffer = &mut self.buffer;
        buffer.clear();
        for (idx, (key, value)) in params.iter().enumerate() {
            match buffer.entries.get_mut(idx) {
                Some((k, v)) => {
                    k.push_str(key);
                    v.push_str(value);
                }
                None => buffer.entries.push((key.to_owned(), value.to_owned())),
            }
        }
        buffer.len = params.len();
    }

    /// Value of the first parameter named `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|(key, _)| *key == name).map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.buffer.entries[..self.buffer.len]
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.buffer.len
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.len == 0
    }
}

impl Drop for PooledParams<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffer));
    }
}
