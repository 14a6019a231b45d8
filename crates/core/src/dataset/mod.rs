pub mod dataset_directory;
pub mod unique_id;
