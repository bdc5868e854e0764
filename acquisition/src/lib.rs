mod backoff;
mod runner;
mod store;

pub use runner::{AcquisitionConfig, AcquisitionHandle, spawn};
pub use store::{LinkStatus, SnapshotStore};
