pub mod create_dataset_use_case;
pub mod preconditions;
pub mod session_logger;
pub mod track_presence_use_case;
pub mod train_recognizer_use_case;
