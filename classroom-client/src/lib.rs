//! Typed access to the classroom proxy, and the status board session that
//! pages drive through it.

pub mod client;
pub mod session;
