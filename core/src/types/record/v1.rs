use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use super::RecordVariant;

/// A provisionally pinned, non-origin content hash. The hash itself is the
/// table key; only the admission time is stored in the row.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct PinRecord {
    pub first_seen_at: SystemTime,
}

impl RecordVariant for PinRecord {
    const VERSION: u8 = 1;
}
