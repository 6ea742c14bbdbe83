pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod web;

pub use crate::config::{AppConfig, ResolvedConfig};
pub use crate::error::{AppError, AppResult};
