//! Business logic layer

pub mod relay;

pub use relay::{RelayOutcome, RelayService};
