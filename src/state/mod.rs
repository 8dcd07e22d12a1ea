//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `WorkItem`: one fund to fetch (key + display label)
//! - `QueueEntry`: a work item paired with the attempts already spent on it
//! - `BackoffState`: the consecutive-failure counter that drives cooldowns

mod backoff_state;
mod work_item;

// Re-export main types
pub use backoff_state::BackoffState;
pub use work_item::{QueueEntry, WorkItem};
