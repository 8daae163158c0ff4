//! External collaborators: blob storage and the results database.
//!
//! Both are injected into the job processor as trait objects, so a worker
//! can run against Supabase, local directories, or test fakes.

mod database;
mod storage;

pub use database::{Database, ExtractionRecord, FsDatabase, StatusUpdate, SupabaseDatabase};
pub use storage::{LocalStorage, Storage, SupabaseStorage};
