mod location;
mod markers;
mod webhook;

pub use location::{LocationRecord, NewLocation};
pub use markers::{group_by_coordinates, MarkerGroup, MarkerSource};
pub use webhook::InboundEmail;
