//! In-memory adapters for worker model ports.

mod coordination;
mod repository;

pub use coordination::InMemoryCoordinationStore;
pub use repository::InMemoryWorkerModelRepository;
