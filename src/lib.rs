//! CMS-editable HTTP error pages with static fallbacks.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub(crate) mod util;
