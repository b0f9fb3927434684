pub mod analysis;
pub mod baseline;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod export;
pub mod lifecycle;
pub mod parameters;
pub mod population;
pub mod projection;
pub mod propagation;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod types;
