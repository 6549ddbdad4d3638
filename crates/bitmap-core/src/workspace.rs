//! Fallible workspace allocation
//!
//! Every buffer an assignment call needs goes through a [`Workspace`], which
//! turns allocation failure into [`Error::OutOfMemory`] instead of aborting,
//! and enforces the optional per-call byte limit from
//! [`AssignConfig::workspace_limit`](crate::config::AssignConfig).
//!
//! Buffers are plain `Vec`s owned by the caller, so they are released on
//! every exit path, error included.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-call allocation budget
#[derive(Debug, Default)]
pub struct Workspace {
    limit: Option<usize>,
    used: AtomicUsize,
}

impl Workspace {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Bytes charged so far
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    fn charge<T>(&self, count: usize, context: &'static str) -> Result<()> {
        let bytes = count
            .checked_mul(std::mem::size_of::<T>())
            .ok_or_else(|| Error::out_of_memory::<T>(count, context))?;
        let used = self.used.fetch_add(bytes, Ordering::Relaxed).saturating_add(bytes);
        if let Some(limit) = self.limit {
            if used > limit {
                self.used.fetch_sub(bytes, Ordering::Relaxed);
                log::debug!("workspace limit {limit} exceeded by {context} ({bytes} bytes)");
                return Err(Error::OutOfMemory { bytes, context });
            }
        }
        Ok(())
    }

    /// Empty vector with room for `count` items
    pub fn try_with_capacity<T>(&self, count: usize, context: &'static str) -> Result<Vec<T>> {
        self.charge::<T>(count, context)?;
        let mut v = Vec::new();
        v.try_reserve_exact(count)
            .map_err(|_| Error::out_of_memory::<T>(count, context))?;
        Ok(v)
    }

    /// Vector of `count` copies of `value`
    pub fn try_filled<T: Clone>(
        &self,
        count: usize,
        value: T,
        context: &'static str,
    ) -> Result<Vec<T>> {
        let mut v = self.try_with_capacity(count, context)?;
        v.resize(count, value);
        Ok(v)
    }
}
