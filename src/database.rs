pub mod client;
pub mod repositories;
pub mod surrdb_utils;
