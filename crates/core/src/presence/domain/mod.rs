pub mod frame_observation;
pub mod presence_tracker;
pub mod tracker_error;
pub mod visit_ledger;
pub mod visit_record;
