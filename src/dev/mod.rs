/// Development collaborators
///
/// In-process stand-ins for the live feed and the local store, used by
/// tests and by the CLI when no snapshot files are given.
pub mod memory_store;
pub mod mock_client;

pub use memory_store::MemoryStore;
pub use mock_client::MockFeed;
