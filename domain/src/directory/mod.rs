//! Registered callers and their role profiles.

pub mod entities;
pub mod user_directory;
