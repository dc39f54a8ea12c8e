//! Application services layer.

pub mod artifacts;
pub mod error;
pub mod error_pages;
pub mod render;
pub mod repos;
pub mod theme;
