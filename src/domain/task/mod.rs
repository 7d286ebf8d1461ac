// Task domain module
// Contains the task aggregate, its typed context, value objects and events

#![allow(clippy::module_inception)]

pub mod context;
pub mod events;
pub mod task;
pub mod value_objects;

pub use context::TaskContext;
pub use events::TaskEvent;
pub use task::{NewTask, Task};
pub use value_objects::{TaskPriority, TaskStatus};
