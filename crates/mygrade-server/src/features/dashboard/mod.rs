//! Admin dashboard: student and class totals, the pass/fail split, and the
//! month calendar

pub mod calendar;
pub mod queries;
pub mod routes;

pub use calendar::{CalendarDay, CalendarWeek, MonthCalendar, WEEKDAY_HEADERS};
pub use queries::{live_stats, DashboardStats, DashboardStatsError, DashboardStatsQuery};
pub use routes::{dashboard_routes, DashboardResponse};
