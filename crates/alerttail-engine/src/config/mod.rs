pub mod parser;
pub mod types;
pub mod validator;

pub use types::{ApiConfig, AppConfig, Credentials, WatchConfig, WatchSettings};
