//! Systems - logic that operates on robots and the shared site

mod agent;
mod dispatcher;
mod telemetry;

pub use agent::*;
pub use dispatcher::*;
pub use telemetry::*;
