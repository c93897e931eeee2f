//! CSV format reading and writing operations.

mod read;
mod write;

pub use read::{read_attribute_csv, read_attribute_dir};
pub use write::{node_table, write_node_tables};
