pub mod profile_batch;

pub use profile_batch::{BatchJobStats, ProfileBatchConfig, ProfileBatchJob};
