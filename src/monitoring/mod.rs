pub mod events;
pub mod format;
pub mod latency;
pub mod metrics;
pub mod types;

pub use latency::*;
pub use self::metrics::try_init_prometheus;
pub use types::*;
