// Profile / Compass synchronization.
// The store owns the only in-memory copy of UserData; views read snapshots
// and go through store operations for every change.

pub mod backend;
pub mod poller;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::ProfileBackend;
pub use poller::{PollConfig, PollHandle, PollStop, RecommendationPoller};
pub use store::{StoreSnapshot, SyncStore};
