pub mod classify_types;
pub mod fs_types;
