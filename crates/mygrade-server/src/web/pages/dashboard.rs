use axum::extract::State;
use maud::{html, Markup, PreEscaped};

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::features::dashboard::{
    queries::stats, DashboardStats, DashboardStatsError, DashboardStatsQuery, MonthCalendar,
    WEEKDAY_HEADERS,
};
use crate::web::layout::{page, PageOptions};

const LIVE_STATS_SCRIPT: &str = r#"
window.onLiveSnapshot = function (stats) {
  Object.keys(stats).forEach(function (key) {
    var cell = document.querySelector('[data-stat="' + key + '"]');
    if (cell) cell.textContent = stats[key];
  });
};
"#;

#[tracing::instrument(skip(state))]
pub async fn dashboard_page(State(state): State<AppState>) -> AppResult<Markup> {
    let stats = stats::handle(state.store.as_ref(), DashboardStatsQuery)
        .await
        .map_err(|DashboardStatsError::Store(e)| AppError::Store(e))?;

    let options = PageOptions {
        inactivity: Some(state.activity.timeout()),
        live: Some("/api/v1/dashboard/live".to_string()),
        admin_nav: true,
        ..PageOptions::default()
    };

    Ok(page(
        "Dashboard",
        &options,
        html! {
            h1 { "Dashboard" }
            (cards(&stats))
            h2 { "Calendar" }
            (calendar(&MonthCalendar::current()))
            script { (PreEscaped(LIVE_STATS_SCRIPT)) }
        },
    ))
}

fn cards(stats: &DashboardStats) -> Markup {
    let cards = [
        ("Total Students", "totalStudents", stats.total_students),
        ("Total Sections", "totalClasses", stats.total_classes),
        ("Total Subjects", "totalSubjects", stats.total_subjects),
        ("Passed Students", "passed", stats.passed),
        ("Failed Students", "failed", stats.failed),
    ];

    html! {
        div.cards {
            @for (label, key, value) in cards {
                div.card {
                    div { (label) }
                    div.value data-stat=(key) { (value) }
                }
            }
        }
    }
}

fn calendar(month: &MonthCalendar) -> Markup {
    html! {
        table.calendar {
            caption { (month.title) }
            thead {
                tr {
                    th { "Wk" }
                    @for day in WEEKDAY_HEADERS {
                        th { (day) }
                    }
                }
            }
            tbody {
                @for week in &month.weeks {
                    tr {
                        td.week { (week.number) }
                        @for day in &week.days {
                            td.muted[!day.in_month].today[day.today] { (day.day) }
                        }
                    }
                }
            }
        }
    }
}
