//! Single-writer editing coordinator and event stream APIs.

/// Event stream types emitted by the coordinator.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
/// Trailing-debounce bookkeeping for preview dispatch.
pub mod scheduler;
