pub mod client;
pub mod connection;
pub mod error;
pub mod events;
pub mod models;
