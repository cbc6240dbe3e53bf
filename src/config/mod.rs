//! Configuration management module

pub mod env;
pub mod parser;
pub mod suffixes;
pub mod validation;

pub use env::EnvManager;
pub use parser::{display_config_summary, load_config, ConfigParser};
pub use suffixes::read_suffix_file;
pub use validation::{validate_config, ConfigValidator, ConfigWarning, ValidationLevel};

pub use crate::models::Config;
