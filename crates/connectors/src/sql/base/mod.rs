pub mod adapter;
pub mod config;
pub mod destination;
pub mod error;
pub mod source;
