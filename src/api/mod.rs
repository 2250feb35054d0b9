pub mod across;
pub mod serde_helpers;

pub use across::{AcrossApiClient, AcrossError};
