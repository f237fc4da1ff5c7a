pub mod instance;
pub mod runtime;

pub use instance::{HandleOutcome, WasmInstance};
pub use runtime::WasmRuntime;
