pub mod bridge;
pub mod constants;
pub mod data_backend;
pub mod data_types;
pub mod db_operations;
pub mod errors;
pub mod session;
pub mod session_cache;
pub mod shared_main;
