//! Decides where a user lands and what the status page shows.

pub mod resolver;
pub mod view;

pub use resolver::{Resolution, ResolveError, SessionStatusResolver, StatusError};
pub use view::{NextAction, StatusView};
