//! Configuration for assignment calls

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tuning knobs shared by every traversal of an assignment call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignConfig {
    /// Work items a single thread should handle before another is added
    pub chunk: usize,
    /// Upper bound on threads used by one traversal
    pub max_threads: usize,
    /// Tasks created per thread when a traversal is split
    pub tasks_per_thread: usize,
    /// Collapse a bitmap whose every position is present to full
    pub promote_full: bool,
    /// Cap on workspace bytes one call may allocate
    pub workspace_limit: Option<usize>,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            chunk: 64 * 1024,
            max_threads: num_cpus::get(),
            tasks_per_thread: 8,
            promote_full: true,
            workspace_limit: None,
        }
    }
}

impl AssignConfig {
    /// Configuration that always runs a single task
    pub fn single_threaded() -> Self {
        Self {
            max_threads: 1,
            ..Self::default()
        }
    }

    /// Parse from a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidParameter(format!("bad assign config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk == 0 {
            return Err(Error::InvalidParameter("chunk must be positive".to_string()));
        }
        if self.max_threads == 0 {
            return Err(Error::InvalidParameter(
                "max_threads must be positive".to_string(),
            ));
        }
        if self.tasks_per_thread == 0 {
            return Err(Error::InvalidParameter(
                "tasks_per_thread must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Threads worth using for `work` items
    pub fn nthreads(&self, work: usize) -> usize {
        let wanted = work / self.chunk.max(1);
        wanted.clamp(1, self.max_threads.max(1))
    }

    /// Number of tasks to split `work` items into
    pub fn ntasks(&self, work: usize) -> usize {
        let nthreads = self.nthreads(work);
        if nthreads == 1 {
            1
        } else {
            (self.tasks_per_thread * nthreads).min(work).max(1)
        }
    }
}
