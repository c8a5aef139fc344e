pub mod traits;
pub mod general;
pub mod evolution;
pub mod manager;

pub use manager::{AppConfig, ConfigManager};
pub use general::GeneralConfig;
pub use evolution::EvolutionConfig;
