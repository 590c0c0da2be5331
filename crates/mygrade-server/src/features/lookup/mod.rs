pub mod queries;
pub mod routes;

pub use queries::{
    Celebration, FindStudentError, FindStudentQuery, FindStudentResponse, GradeBadge,
};
pub use routes::lookup_routes;
