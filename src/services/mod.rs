pub mod classifier;
pub mod filter_service;
pub mod fs_service;
