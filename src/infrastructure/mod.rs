// Infrastructure layer module
// Contains database adapters and execution backends
// Follows Hexagonal Architecture

pub mod execution;
pub mod repositories;
