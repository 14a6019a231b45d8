pub mod capture;
pub mod dataset;
pub mod detection;
pub mod pipeline;
pub mod presence;
pub mod recognition;
pub mod shared;
