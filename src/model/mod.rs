pub mod block;
pub mod class_token;
pub mod edit;
pub mod element;
pub mod report;
pub mod span;

pub use block::{BlockKind, ExtractedBlock};
pub use class_token::{ClassToken, Confidence, Provenance};
pub use edit::{EditKind, EditOperation};
pub use element::{Attributes, Element};
pub use report::{BatchItem, BatchItemError, BatchItemStatus, BatchReport};
pub use span::Span;
