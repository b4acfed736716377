pub mod config;
pub mod messaging;
pub mod observability;
pub mod worker;
