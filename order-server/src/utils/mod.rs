//! Cross-cutting utilities: unified error handling, logging, business time.

pub mod error;
pub mod logger;
pub mod time;

pub use error::{ok, AppError, AppResponse, AppResult};
pub use logger::{init_logger, init_logger_with_file};
