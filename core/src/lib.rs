pub mod core;
pub mod ipfs;
pub mod registry;
pub mod types;

pub use crate::core::error::PinnerError;
pub use crate::core::source::{OriginSource, PinSource, SourceError, Unpinner};
pub use crate::core::{EvictionFailure, Pinner, RunOutcome};
