//! Infrastructure adapters and runtime bootstrap.

pub mod artifacts;
pub mod error;
pub mod http;
pub mod pages;
pub mod render;
pub mod requirements;
pub mod telemetry;
