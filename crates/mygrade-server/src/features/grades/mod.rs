//! Grade sheets of a class: spreadsheet upload, the inline-edit grid and
//! row deletion
//!
//! Every write lands twice: in `classes/{classId}/students/{idNumber}` for
//! the grid and in `students/{idNumber}` (with `classId`) for the public
//! lookup.

pub mod commands;
pub mod grid;
pub mod queries;
pub mod routes;
pub mod spreadsheet;

pub use commands::{
    DeleteRowCommand, DeleteRowError, DeleteRowResponse, EditRowCommand, EditRowError,
    EditRowResponse, UploadGradesCommand, UploadGradesError, UploadGradesResponse,
};
pub use grid::{build_grid, GridColumn, GridQuery, GridRow, GridView, SortKey, SortOrder};
pub use queries::{ListRowsError, ListRowsQuery, ListRowsResponse};
pub use routes::grades_routes;
pub use spreadsheet::SpreadsheetError;
