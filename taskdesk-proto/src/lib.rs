//! Shared task definitions and interchange format for `taskdesk`.

pub mod codec;
pub mod task;
pub mod timestamp;
