//! Everything that talks to the upstream classroom service.

pub mod body;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod like;
