//! Record storage.
//!
//! The [`RecordStore`] trait is the contract against an external document
//! store; [`InMemoryRecordStore`] is the bundled reference backend.

mod filter;
mod memory;
mod traits;

pub use filter::{with_active_filter, RecordFilter};
pub use memory::InMemoryRecordStore;
pub use traits::{RecordStore, StorageError};
