//! Batching policy: when a group of concurrently arriving requests is released.

pub mod policy;
