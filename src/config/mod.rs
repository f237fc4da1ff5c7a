mod consts;
mod loader;
mod validation;

pub use consts::{
    DEFAULT_BROKER_MAX_ATTEMPTS, DEFAULT_BROKER_WORKERS, DEFAULT_FUEL_LEVEL, MAX_FUEL_LEVEL,
    MIN_FUEL_LEVEL,
};
pub use loader::{
    load_and_validate_config, load_config, AppletConfig, BrokerConfig, ChainConfig,
    EventTypeSpec, FuelConfig, GatewayConfig, ProjectConfig, PublisherConfig, RuntimeConfig,
    RuntimeKind, StrategyConfig,
};
pub use validation::{validate_config, ConfigValidationError};
