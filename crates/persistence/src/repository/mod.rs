//! Repository implementations for database operations

pub mod hits;
pub mod metrics;
pub mod recurring;

pub use hits::*;
pub use metrics::*;
pub use recurring::*;
