pub mod bracket;
pub mod config;
pub mod elo;
pub mod error;
pub mod finish;
pub mod group;
pub mod knockout;
pub mod loader;
pub mod monte_carlo;
pub mod prob;
pub mod sampler;
pub mod state;

pub use config::SimConfig;
pub use error::{SimError, SimResult};
