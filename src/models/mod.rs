//! Domain types: stations, trains, and the event queue.

pub mod event;
pub mod station;
pub mod train;

pub use event::{Event, EventQueue};
pub use station::{Cohort, Station};
pub use train::Train;
