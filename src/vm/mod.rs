mod lifecycle;
mod registry;
mod state;

pub use lifecycle::LifecycleController;
pub use registry::InstanceRegistry;
pub use state::{InstanceState, StateCell};
