mod entitlement;
mod entry;
mod parse;
mod stats;
mod storage;
mod store;
mod timeline;

pub use entitlement::LocalEntitlement;
pub use entry::{Entry, FREE_ENTRY_LIMIT, MAX_ENTRY_CHARS};
pub use stats::{compute_stats, monthly_counts};
pub use storage::FileStore;
pub use store::JournalStore;
pub use timeline::{TimelineFilter, timeline_sections};
