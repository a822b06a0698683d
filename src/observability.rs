//! Observer hooks for mark preparation.
//!
//! Implementors can record metrics or logs for each build stage; the pipeline itself
//! stays silent when no observer is configured.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Build events emitted by [`crate::pipeline::MarkPipeline`].
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// A mark build started.
    BuildStarted {
        /// Input row count.
        rows: usize,
        /// Input facet count.
        facets: usize,
    },
    /// The composed transform stage ran.
    TransformApplied {
        /// Facet count after the stage.
        facets: usize,
        /// Total row indices across facets after the stage.
        indices: usize,
    },
    /// Channels were derived from descriptors.
    ChannelsDerived {
        /// Number of channels.
        channels: usize,
    },
    /// The composed initializer stage ran.
    InitializerApplied {
        /// Number of channels the stage added or replaced.
        channels_updated: usize,
    },
    /// A deferred domain thunk was attached for a channel.
    DomainDeferred {
        /// The channel name the thunk is keyed by.
        channel: String,
    },
    /// The build finished.
    BuildFinished {
        /// Wall-clock build duration.
        elapsed: Duration,
    },
}

/// Observer hook for build events.
pub trait BuildObserver: Send + Sync {
    /// Called once per emitted event, in build order.
    fn on_event(&self, event: &BuildEvent);
}

/// A simple stderr logger for build events.
#[derive(Debug, Default)]
pub struct StdErrBuildObserver;

impl BuildObserver for StdErrBuildObserver {
    fn on_event(&self, event: &BuildEvent) {
        eprintln!("[pipeline] {event:?}");
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeBuildObserver {
    observers: Vec<Arc<dyn BuildObserver>>,
}

impl CompositeBuildObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn BuildObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeBuildObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeBuildObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl BuildObserver for CompositeBuildObserver {
    fn on_event(&self, event: &BuildEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
