/// Database configuration and connection management
pub mod database;

/// Token-economy configuration loading from config.toml
pub mod economy;
