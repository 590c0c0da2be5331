pub mod classes;
pub mod dashboard;
pub mod login;
pub mod sheet;
pub mod student;
