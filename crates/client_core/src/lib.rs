//! Client side of the check-in manager: the event store contract, its HTTP
//! implementation, the dashboard controller and text views.

pub mod dashboard;
pub mod error;
pub mod store;
pub mod views;

pub use dashboard::{Confirm, Dashboard, DashboardState};
pub use error::DashboardError;
pub use store::{EventStore, HttpEventStore};
