//! Type definitions for runtime configuration and policies

mod runtime_config;

pub use runtime_config::*;
