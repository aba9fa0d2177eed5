pub mod task;
pub mod user;

pub use task::{NewTask, Task, TaskPatch, TaskPriority, ValidatedTask};
pub use user::{User, UserCredentials};
