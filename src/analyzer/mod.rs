pub mod blocks;
pub mod class_usage;
pub mod component;
mod html_parser;
pub mod literals;
pub mod orphan;
pub mod patterns;
pub mod project;
pub mod structure;
pub mod stylesheet;
pub mod validation;
pub mod xpath;

pub use blocks::{extract_delimited, extract_style_block, find_all_regions, remove_all_blocks};
pub use class_usage::{class_tokens, used_classes};
pub use component::{component_usages, ComponentUsage};
pub use html_parser::HtmlParser;
pub use orphan::{scan_orphans, OrphanOptions};
pub use patterns::{duplicate_patterns, DuplicatePattern};
pub use project::{audit, scan_orphans_in_dir, used_classes_in_dir, AuditReport};
pub use structure::{parse, query, Document};
pub use validation::validate;
pub use xpath::PathQuery;
