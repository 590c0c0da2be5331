pub mod list_rows;

pub use list_rows::{ListRowsError, ListRowsQuery, ListRowsResponse};
