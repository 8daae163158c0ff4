//! Typed extraction output.
//!
//! Every structure here is produced by the pipeline in a single pass and
//! serialized as-is for the database collaborator.

mod page;
mod result;
mod table;

pub use page::PageContent;
pub use result::{DocumentStatus, ExtractionMetadata, ExtractionMethod, ExtractionResult};
pub use table::{ExtractedTable, RawTable, TableCell};
