//! Execution engines for controlling how traversal tasks run
//!
//! Every traversal is a flat parallel-for over independent tasks followed by
//! a join. The engine decides whether the tasks run on the calling thread or
//! on a Rayon pool; the traversal decides what the tasks are.
//!
//! # Design Philosophy
//!
//! - **Unified Control**: One engine type parameter picks sequential or parallel
//! - **Zero-Cost**: Task bodies are generic closures, monomorphised per call site
//! - **Thread Pool Integration**: Works with the global Rayon pool or a custom one

#[cfg(feature = "parallel")]
use crate::Result;

/// Execution strategy for task batches
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExecutionStrategy {
    /// Process tasks sequentially
    Sequential,
    /// Process tasks in parallel
    Parallel,
}

/// Trait for execution engines that run batches of independent tasks
pub trait ExecutionEngine: Clone + Send + Sync {
    /// Execute a function in the engine's execution context
    fn execute<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send;

    /// Run `f(t)` for every task `t in 0..count`, collecting results in task order
    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send;

    /// Run `f(t)` for every task and sum the results
    ///
    /// Used to reduce per-task entry-count deltas after a traversal.
    fn sum_batch<F>(&self, count: usize, f: F) -> i64
    where
        F: Fn(usize) -> i64 + Sync + Send;

    /// Get the execution strategy
    fn strategy(&self) -> ExecutionStrategy;

    /// Check if parallel execution is available
    fn is_parallel(&self) -> bool {
        self.strategy() == ExecutionStrategy::Parallel
    }

    /// Get the number of threads available
    fn num_threads(&self) -> usize;
}

/// Sequential execution engine
///
/// Executes all tasks in order on the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialEngine;

impl SequentialEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionEngine for SequentialEngine {
    fn execute<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        f()
    }

    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        (0..count).map(f).collect()
    }

    fn sum_batch<F>(&self, count: usize, f: F) -> i64
    where
        F: Fn(usize) -> i64 + Sync + Send,
    {
        (0..count).map(f).sum()
    }

    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Sequential
    }

    fn num_threads(&self) -> usize {
        1
    }
}

/// Parallel execution engine using Rayon
///
/// Executes tasks in parallel using Rayon's thread pool.
#[cfg(feature = "parallel")]
#[derive(Clone, Debug, Default)]
pub struct ParallelEngine {
    thread_pool: Option<std::sync::Arc<rayon::ThreadPool>>,
}

#[cfg(feature = "parallel")]
impl ParallelEngine {
    /// Create a new parallel engine with the global thread pool
    pub fn new() -> Self {
        Self { thread_pool: None }
    }

    /// Create a new parallel engine with a custom thread pool
    pub fn with_thread_pool(pool: std::sync::Arc<rayon::ThreadPool>) -> Self {
        Self {
            thread_pool: Some(pool),
        }
    }

    /// Create with a specific number of threads
    pub fn with_num_threads(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {e}"))?;

        Ok(Self {
            thread_pool: Some(std::sync::Arc::new(pool)),
        })
    }
}

#[cfg(feature = "parallel")]
impl ExecutionEngine for ParallelEngine {
    fn execute<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if let Some(pool) = &self.thread_pool {
            pool.install(f)
        } else {
            f()
        }
    }

    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        use rayon::prelude::*;

        if count <= 1 {
            return (0..count).map(f).collect();
        }
        if let Some(pool) = &self.thread_pool {
            pool.install(|| (0..count).into_par_iter().map(f).collect())
        } else {
            (0..count).into_par_iter().map(f).collect()
        }
    }

    fn sum_batch<F>(&self, count: usize, f: F) -> i64
    where
        F: Fn(usize) -> i64 + Sync + Send,
    {
        use rayon::prelude::*;

        if count <= 1 {
            return (0..count).map(f).sum();
        }
        if let Some(pool) = &self.thread_pool {
            pool.install(|| (0..count).into_par_iter().map(f).sum())
        } else {
            (0..count).into_par_iter().map(f).sum()
        }
    }

    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Parallel
    }

    fn num_threads(&self) -> usize {
        if let Some(pool) = &self.thread_pool {
            pool.current_num_threads()
        } else {
            rayon::current_num_threads()
        }
    }
}

/// Create a sequential engine
pub fn sequential() -> SequentialEngine {
    SequentialEngine
}

/// Create a parallel engine on the global Rayon pool
#[cfg(feature = "parallel")]
pub fn parallel() -> ParallelEngine {
    ParallelEngine::new()
}

/// Create an engine based on available features
#[cfg(feature = "parallel")]
pub fn auto_engine() -> ParallelEngine {
    ParallelEngine::new()
}

/// Create an engine based on available features
#[cfg(not(feature = "parallel"))]
pub fn auto_engine() -> SequentialEngine {
    SequentialEngine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_engine() {
        let engine = sequential();

        let result = engine.execute(|| 42);
        assert_eq!(result, 42);

        let squares = engine.execute_batch(5, |i| i * i);
        assert_eq!(squares, vec![0, 1, 4, 9, 16]);

        let total = engine.sum_batch(4, |t| t as i64 - 1);
        assert_eq!(total, 2);

        assert_eq!(engine.strategy(), ExecutionStrategy::Sequential);
        assert_eq!(engine.num_threads(), 1);
        assert!(!engine.is_parallel());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_engine() {
        let engine = parallel();

        let squares = engine.execute_batch(100, |i| i * 2);
        assert_eq!(squares.len(), 100);
        assert_eq!(squares[99], 198);

        let total = engine.sum_batch(1000, |t| if t % 2 == 0 { 1 } else { -1 });
        assert_eq!(total, 0);

        assert_eq!(engine.strategy(), ExecutionStrategy::Parallel);
        assert!(engine.num_threads() > 0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_custom_pool() {
        let engine = ParallelEngine::with_num_threads(2).unwrap();
        assert_eq!(engine.num_threads(), 2);
        assert_eq!(engine.execute(|| rayon::current_num_threads()), 2);
        assert_eq!(engine.sum_batch(10, |t| t as i64), 45);
    }

    #[test]
    fn test_auto_engine() {
        let engine = auto_engine();
        assert!(engine.num_threads() > 0);
        assert_eq!(engine.sum_batch(3, |_| 2), 6);
    }
}
