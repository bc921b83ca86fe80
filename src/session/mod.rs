//! Export sessions: cancellation, progress, engine selection and the session state machine.

/// Cooperative cancellation flag.
pub mod abort;
/// Ordered engine fallback chain.
pub mod factory;
/// One-export-at-a-time session manager.
pub mod manager;
/// Progress sinks and the monotonic reporter.
pub mod progress;
