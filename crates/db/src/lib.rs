pub mod connection;
pub mod ddl;
pub mod executor;
pub mod fixtures;

pub use connection::{connect, connect_read_only, connect_with_settings, DbPool};
pub use executor::PoolQueryExecutor;
pub use fixtures::{SeedDataset, SeedSummary};
