pub mod aggregate_cache;
pub mod collaborators;
pub mod orchestrator;
pub mod profile;
pub mod scoring;
pub mod signals;
pub mod view_ledger;

pub use aggregate_cache::{AggregateBaseline, AggregateCache, UserActivityPattern};
pub use collaborators::{
    CoachLinks, CollaboratorError, ContentStore, EngagementSource, InMemoryContentStore,
    InMemoryEngagementSource, InMemoryTenantConfig, TenantConfigStore,
};
pub use orchestrator::RankingOrchestrator;
pub use profile::{ProfileStore, UserProfile};
pub use view_ledger::ViewLedger;
