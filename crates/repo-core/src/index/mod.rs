//! The repository index: addressing, document access, generation, updates
//! and verification

pub mod address;
mod engine;
mod store;
mod verify;

pub use engine::{GenerateReport, IndexEngine, IndexOptions, PackageRef, UpdateReport};
pub use store::DocumentStore;
pub use verify::{VerifyReport, VerifyStatus};
