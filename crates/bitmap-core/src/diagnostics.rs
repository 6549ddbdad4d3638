//! Diagnostic events emitted by assignment calls
//!
//! Every call carries a [`DiagnosticsSink`] in its context instead of a
//! global verbosity switch. The engine reports which case routine ran, each
//! traversal phase it completed, and any representation change of the
//! target. Sinks decide what to do with them: forward to the `log` crate,
//! collect them for inspection, or drop them.

use crate::matrix::Format;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Event emitted while an assignment call runs
#[derive(Debug, Clone, PartialEq)]
pub enum AssignEvent {
    /// Call started on a target of the given shape
    CallStarted {
        trace_id: Uuid,
        operation: &'static str,
        nrows: usize,
        ncols: usize,
    },

    /// Case routine chosen by the dispatcher
    CaseSelected {
        trace_id: Uuid,
        case: &'static str,
    },

    /// One traversal phase finished
    PhaseCompleted {
        trace_id: Uuid,
        phase: &'static str,
        ntasks: usize,
        nvals_delta: i64,
    },

    /// Target changed physical format
    Converted {
        trace_id: Uuid,
        from: Format,
        to: Format,
    },

    /// Call completed
    CallCompleted {
        trace_id: Uuid,
        nvals: usize,
        duration: std::time::Duration,
    },

    /// Call failed; the target is unchanged
    CallFailed {
        trace_id: Uuid,
        error: String,
    },
}

impl AssignEvent {
    pub fn trace_id(&self) -> Uuid {
        match self {
            Self::CallStarted { trace_id, .. }
            | Self::CaseSelected { trace_id, .. }
            | Self::PhaseCompleted { trace_id, .. }
            | Self::Converted { trace_id, .. }
            | Self::CallCompleted { trace_id, .. }
            | Self::CallFailed { trace_id, .. } => *trace_id,
        }
    }
}

/// Trait for consumers of assignment events
pub trait DiagnosticsSink: Send + Sync {
    /// Handle an event
    fn handle_event(&self, event: &AssignEvent);

    /// Check if this sink is interested in a particular event
    fn is_interested(&self, event: &AssignEvent) -> bool {
        let _ = event;
        true
    }

    /// Get the name of this sink for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Deliver `event` if the sink wants it
    fn emit(&self, event: AssignEvent) {
        if self.is_interested(&event) {
            self.handle_event(&event);
        }
    }
}

/// Forwards events to the `log` crate
#[derive(Debug, Clone, Copy)]
pub struct LoggingSink {
    level: log::Level,
}

impl LoggingSink {
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingSink {
    fn default() -> Self {
        Self::new(log::Level::Debug)
    }
}

impl DiagnosticsSink for LoggingSink {
    fn handle_event(&self, event: &AssignEvent) {
        match event {
            AssignEvent::CallStarted {
                trace_id,
                operation,
                nrows,
                ncols,
            } => {
                log::log!(self.level, "{operation} started on {nrows}x{ncols} (trace: {trace_id})");
            }
            AssignEvent::CaseSelected { trace_id, case } => {
                log::log!(self.level, "bitmap assign case {case} (trace: {trace_id})");
            }
            AssignEvent::Converted { trace_id, from, to } => {
                log::log!(self.level, "converted {from:?} to {to:?} (trace: {trace_id})");
            }
            AssignEvent::CallCompleted {
                trace_id,
                nvals,
                duration,
            } => {
                log::log!(self.level, "completed with {nvals} entries in {duration:?} (trace: {trace_id})");
            }
            AssignEvent::CallFailed { trace_id, error } => {
                log::error!("assignment failed: {error} (trace: {trace_id})");
            }
            AssignEvent::PhaseCompleted { .. } => {
                log::trace!("assign event: {event:?}");
            }
        }
    }
}

/// Keeps every event in memory
///
/// Clones share the same buffer, so a test can keep one handle and hand
/// another to the call.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<AssignEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<AssignEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Names of the case routines selected so far, in order
    pub fn cases(&self) -> Vec<&'static str> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                AssignEvent::CaseSelected { case, .. } => Some(*case),
                _ => None,
            })
            .collect()
    }

    /// How often each case routine was selected
    pub fn case_counts(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for case in self.cases() {
            *counts.entry(case).or_insert(0) += 1;
        }
        counts
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl DiagnosticsSink for CollectingSink {
    fn handle_event(&self, event: &AssignEvent) {
        let Ok(mut events) = self.events.lock() else {
            log::error!("Failed to lock collected events");
            return;
        };
        events.push(event.clone());
    }
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn handle_event(&self, _event: &AssignEvent) {}

    fn is_interested(&self, _event: &AssignEvent) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_shares_buffer() {
        let sink = CollectingSink::new();
        let handle = sink.clone();
        let trace_id = Uuid::new_v4();

        sink.emit(AssignEvent::CaseSelected {
            trace_id,
            case: "mask_accum",
        });
        sink.emit(AssignEvent::CaseSelected {
            trace_id,
            case: "mask_accum",
        });
        sink.emit(AssignEvent::Converted {
            trace_id,
            from: Format::Bitmap,
            to: Format::Full,
        });

        assert_eq!(handle.events().len(), 3);
        assert_eq!(handle.cases(), vec!["mask_accum", "mask_accum"]);
        assert_eq!(handle.case_counts()["mask_accum"], 2);
        assert!(handle.events().iter().all(|e| e.trace_id() == trace_id));

        handle.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_sink_ignores_events() {
        let sink = NullSink;
        let event = AssignEvent::CallFailed {
            trace_id: Uuid::new_v4(),
            error: "boom".to_string(),
        };
        assert!(!sink.is_interested(&event));
        sink.emit(event);
    }

    #[test]
    fn test_logging_sink_handles_every_event() {
        let sink = LoggingSink::new(log::Level::Info);
        let trace_id = Uuid::new_v4();
        let events = [
            AssignEvent::CallStarted {
                trace_id,
                operation: "assign",
                nrows: 3,
                ncols: 3,
            },
            AssignEvent::PhaseCompleted {
                trace_id,
                phase: "scatter",
                ntasks: 1,
                nvals_delta: 0,
            },
            AssignEvent::CallCompleted {
                trace_id,
                nvals: 9,
                duration: std::time::Duration::from_millis(1),
            },
        ];
        for event in events {
            assert!(sink.is_interested(&event));
            sink.emit(event);
        }
        assert!(sink.name().contains("LoggingSink"));
    }
}
