pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{
    CreateClassCommand, CreateClassError, DeleteClassCommand, DeleteClassError,
    DeleteClassResponse, UpdateClassCommand, UpdateClassError, DELETE_CLASS_PROMPT,
};
pub use queries::{
    GetClassError, GetClassQuery, ListClassesError, ListClassesQuery, ListClassesResponse,
};
pub use routes::classes_routes;
pub use types::{filter_classes, ClassRecord};
