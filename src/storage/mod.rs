pub mod memory;
pub mod sqlite;
pub mod trait_def;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use trait_def::{HistoryStore, ReadingStore};

/// Generate a unique id for a history entry: creation millis plus a
/// random suffix, collision-safe enough for an append-only log.
pub(crate) fn generate_entry_id() -> String {
    use rand::RngExt;
    let mut rng = rand::rng();
    let suffix: u32 = rng.random();
    format!("{:x}{:08x}", chrono::Utc::now().timestamp_millis(), suffix)
}
