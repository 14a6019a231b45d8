pub mod clock;
pub mod constants;
pub mod frame;
pub mod identity;
pub mod region;
pub mod workspace_layout;
