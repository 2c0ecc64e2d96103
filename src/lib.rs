pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod mint;
pub mod pipeline;
pub mod storage;

pub use error::{Error, Result};
