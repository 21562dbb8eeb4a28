pub mod config;
pub mod dictionary;
pub mod enrich;
pub mod error;
pub mod export;
pub mod kana;
pub mod models;
pub mod ocr;
pub mod pos;
pub mod service;
pub mod tokenizer;

pub use config::Config;
pub use error::{Result, YomiError};
pub use models::*;
pub use service::Service;
