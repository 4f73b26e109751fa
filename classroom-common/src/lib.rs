//! Domain model of the classroom status board and the client-side state
//! logic that runs on top of it.

pub mod board;
pub mod insights;
pub mod model;
pub mod reconcile;
