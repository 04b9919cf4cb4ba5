pub mod path_matcher;
pub mod razor_config;

pub use path_matcher::PathMatcher;
pub use razor_config::{RazorConfig, CONFIG_FILE_NAME};
