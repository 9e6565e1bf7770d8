pub mod config;
pub mod error;
pub mod job;
pub mod remote;
pub mod store;
