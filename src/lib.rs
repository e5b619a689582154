pub mod config;
pub mod constants;
pub mod engine;
pub mod logging;
pub mod maze;
pub mod rng;
pub mod scheduler;
pub mod types;
