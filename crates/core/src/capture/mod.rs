pub mod domain;
pub mod infrastructure;
pub mod unknown_snapshot_writer;
