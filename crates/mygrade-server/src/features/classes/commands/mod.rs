pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreateClassCommand, CreateClassError};
pub use delete::{DeleteClassCommand, DeleteClassError, DeleteClassResponse, DELETE_CLASS_PROMPT};
pub use update::{UpdateClassCommand, UpdateClassError};
