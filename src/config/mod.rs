pub mod schema;

pub use schema::{Config, MaxLengthConfig, ObservabilityConfig, RefinementConfig};
