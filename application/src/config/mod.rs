//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`DispatchParams`]: responder call control (timeout, history window)

pub mod dispatch_params;

pub use dispatch_params::DispatchParams;
