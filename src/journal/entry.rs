use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ENTRY_PALETTE: [&str; 6] = [
    "#00D9FF", "#B24BF3", "#FFD700", "#10B981", "#EF4444", "#F59E0B",
];

pub const MAX_ENTRY_CHARS: usize = 280;

/// Free-tier journals hold at most this many entries.
pub const FREE_ENTRY_LIMIT: usize = 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub text: String,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub color: String,
}

impl Entry {
    /// Whole days elapsed since the entry was written, never negative.
    pub fn age_days(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = now.signed_duration_since(self.timestamp).num_days();
        elapsed.clamp(0, u32::MAX as i64) as u32
    }
}

pub fn palette_color(index: usize) -> &'static str {
    ENTRY_PALETTE[index % ENTRY_PALETTE.len()]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub is_premium: bool,
    pub entries: Vec<Entry>,
}
