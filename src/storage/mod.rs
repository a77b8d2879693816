pub mod base;
pub mod disk;
pub mod layout;
pub mod memory;
pub mod merge;
pub mod types;

pub use base::{ResultSink, StorageError};
pub use disk::CsvSink;
pub use layout::ColumnLayout;
pub use memory::MemorySink;
pub use merge::merge;
pub use types::{NoticeRow, ResultSet, HEADER};
