pub mod api;
pub mod app;
pub mod auth;
pub mod chat;
pub mod error;
pub mod storage;
pub mod ui;
pub mod utils;

pub use error::{ClientError, Result};
