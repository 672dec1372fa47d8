//! Core data models for the collection log adviser.

mod account;
mod activity;
mod estimate;
mod ids;
mod metric;
mod obtained;
mod overrides;

pub use account::*;
pub use activity::*;
pub use estimate::*;
pub use ids::*;
pub use metric::*;
pub use obtained::*;
pub use overrides::*;
