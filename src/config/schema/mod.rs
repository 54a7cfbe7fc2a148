mod core;
mod observability;
mod refinement;

pub use self::core::Config;
pub use observability::ObservabilityConfig;
pub use refinement::{MaxLengthConfig, RefinementConfig};
