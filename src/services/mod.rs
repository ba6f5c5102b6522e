//! Services: request-independent business logic called by the routes.

pub mod assistant;
pub mod settings;
