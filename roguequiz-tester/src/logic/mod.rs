pub mod autoplay;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod sink;
pub mod tester;

pub use policy::GameplayStrategy;
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use sink::{ActivityLog, ActivityLogStats};
pub use tester::*;
