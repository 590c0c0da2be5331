pub mod find_student;

pub use find_student::{
    Celebration, FindStudentError, FindStudentQuery, FindStudentResponse, GradeBadge,
};
