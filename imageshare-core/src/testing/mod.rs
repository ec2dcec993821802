//! In-memory doubles for service and HTTP tests.

mod memory;

pub use memory::{MemoryImageStorage, MemoryStore, RecordingMailer};
