//! Filesystem and path helpers shared by the key store and the admin repo

pub mod fs;
pub mod path;
