pub mod demo;
pub mod football_data;
pub mod free_data;
pub mod provider;

pub use demo::DemoSource;
pub use football_data::FootballDataClient;
pub use free_data::FreeDataClient;
pub use provider::MatchSource;
