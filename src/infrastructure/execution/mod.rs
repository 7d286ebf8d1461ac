// Execution backends
// Adapters that implement the coordinator's ExecutionCapability port

pub mod echo;
pub mod scripted;

pub use echo::EchoExecutor;
pub use scripted::ScriptedExecutor;
