pub mod config;
pub mod error;
pub mod types;

pub use config::CounselorConfig;
pub use error::{CounselorError, Result};
pub use types::*;
