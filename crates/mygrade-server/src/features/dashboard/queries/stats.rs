use futures::{stream, Stream, StreamExt};
use mygrade_common::grades::{coerce_number, GradeField, GradeStanding};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::features::classes::types::SUBJECT_NAME_KEY;
use crate::store::{CollectionPath, Document, DocumentStore, StoreError, Subscription};

/// Headline numbers of the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Every document in `students`, graded or not
    pub total_students: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_classes: usize,
    /// Distinct non-empty subject names
    pub total_subjects: usize,
}

impl DashboardStats {
    /// Tally a snapshot of `students` and one of `classes`.
    ///
    /// A midterm grade that does not coerce to a number (missing, or text
    /// like `"INC"`) is left out of the pass/fail split but the student is
    /// still counted.
    pub fn aggregate(students: &[Document], classes: &[Document]) -> Self {
        let mut passed = 0;
        let mut failed = 0;
        for student in students {
            let grade = coerce_number(student.data.get(GradeField::MidtermGrade.key()));
            match grade.map(GradeStanding::from_grade) {
                Some(GradeStanding::Passing) => passed += 1,
                Some(GradeStanding::Failing) => failed += 1,
                None => {},
            }
        }

        let subjects: HashSet<&str> = classes
            .iter()
            .filter_map(|class| class.text(SUBJECT_NAME_KEY))
            .filter(|name| !name.is_empty())
            .collect();

        Self {
            total_students: students.len(),
            passed,
            failed,
            total_classes: classes.len(),
            total_subjects: subjects.len(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardStatsQuery;

#[derive(Debug, thiserror::Error)]
pub enum DashboardStatsError {
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

#[tracing::instrument(skip(store, _query))]
pub async fn handle(
    store: &dyn DocumentStore,
    _query: DashboardStatsQuery,
) -> Result<DashboardStats, DashboardStatsError> {
    let students = store.list(&CollectionPath::students()).await?;
    let classes = store.list(&CollectionPath::classes()).await?;

    let stats = DashboardStats::aggregate(&students, &classes);
    tracing::debug!(
        students = stats.total_students,
        classes = stats.total_classes,
        "Dashboard stats computed"
    );
    Ok(stats)
}

// ============================================================================
// Live feed
// ============================================================================

enum FeedUpdate {
    Students(Vec<Document>),
    Classes(Vec<Document>),
}

fn updates<F>(
    subscription: Subscription,
    tag: F,
) -> impl Stream<Item = Result<FeedUpdate, StoreError>> + Send + 'static
where
    F: Fn(Vec<Document>) -> FeedUpdate + Send + 'static,
{
    stream::unfold((subscription, tag), |(mut subscription, tag)| async move {
        let next = subscription.next().await?;
        let update = next.map(|snapshot| tag(snapshot.documents));
        Some((update, (subscription, tag)))
    })
}

/// Dashboard stats over live `students` and `classes` subscriptions.
///
/// Yields nothing until both collections have delivered their first
/// snapshot, then a fresh tally after every change to either. Read
/// failures pass through as `Err` items without ending the feed.
pub fn live_stats(
    store: Arc<dyn DocumentStore>,
) -> impl Stream<Item = Result<DashboardStats, StoreError>> + Send + 'static {
    let students = updates(
        Subscription::open(store.clone(), CollectionPath::students()),
        FeedUpdate::Students,
    );
    let classes = updates(
        Subscription::open(store, CollectionPath::classes()),
        FeedUpdate::Classes,
    );

    stream::select(students, classes)
        .scan(
            (None::<Vec<Document>>, None::<Vec<Document>>),
            |(students, classes), update| {
                let item = match update {
                    Err(e) => Some(Err(e)),
                    Ok(update) => {
                        match update {
                            FeedUpdate::Students(documents) => *students = Some(documents),
                            FeedUpdate::Classes(documents) => *classes = Some(documents),
                        }
                        match (students.as_deref(), classes.as_deref()) {
                            (Some(s), Some(c)) => Some(Ok(DashboardStats::aggregate(s, c))),
                            _ => None,
                        }
                    },
                };
                futures::future::ready(Some(item))
            },
        )
        .filter_map(futures::future::ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{fields, seed_class, seed_student};
    use crate::store::MemoryStore;
    use serde_json::{json, Value};

    fn document(id: &str, data: Value) -> Document {
        Document {
            id: id.to_string(),
            data: fields(data),
        }
    }

    #[test]
    fn test_aggregate_pass_fail_split() {
        let students = vec![
            document("1", json!({ "midtermGrade": 1.75 })),
            document("2", json!({ "midtermGrade": "3.25" })),
            document("3", json!({ "midtermGrade": 5 })),
            document("4", json!({ "midtermGrade": 3.24 })),
        ];
        let stats = DashboardStats::aggregate(&students, &[]);
        assert_eq!(stats.total_students, 4);
        assert_eq!(stats.passed, 2);
        assert_eq!(stats.failed, 2);
    }

    #[test]
    fn test_aggregate_skips_ungraded_students_but_counts_them() {
        let students = vec![
            document("1", json!({ "midtermGrade": "INC" })),
            document("2", json!({ "firstName": "Ana" })),
            document("3", json!({ "midtermGrade": 2.0 })),
        ];
        let stats = DashboardStats::aggregate(&students, &[]);
        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn test_aggregate_distinct_subjects() {
        let classes = vec![
            document("a", json!({ "subjectName": "Programming" })),
            document("b", json!({ "subjectName": "Programming" })),
            document("c", json!({ "subjectName": "programming" })),
            document("d", json!({ "subjectName": "" })),
            document("e", json!({ "courseCode": "IT999" })),
        ];
        let stats = DashboardStats::aggregate(&[], &classes);
        assert_eq!(stats.total_classes, 5);
        assert_eq!(stats.total_subjects, 2);
    }

    #[tokio::test]
    async fn test_handle_reads_both_collections() {
        let store = MemoryStore::new();
        let class_id = seed_class(&store, "IT101", "Programming", "BSIT 1A").await;
        seed_student(&store, &class_id, json!({ "idNumber": "1", "midtermGrade": 2.5 })).await;
        seed_student(&store, &class_id, json!({ "idNumber": "2", "midtermGrade": 4.0 })).await;

        let stats = handle(&store, DashboardStatsQuery).await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_students: 2,
                passed: 1,
                failed: 1,
                total_classes: 1,
                total_subjects: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_live_stats_follow_writes() {
        let store = Arc::new(MemoryStore::new());
        let class_id = seed_class(store.as_ref(), "IT101", "Programming", "BSIT 1A").await;

        let feed = live_stats(store.clone());
        futures::pin_mut!(feed);

        let first = feed.next().await.unwrap().unwrap();
        assert_eq!(first.total_students, 0);
        assert_eq!(first.total_classes, 1);

        seed_student(store.as_ref(), &class_id, json!({ "idNumber": "1", "midtermGrade": 1.5 }))
            .await;

        let mut latest = feed.next().await.unwrap().unwrap();
        while latest.total_students == 0 {
            latest = feed.next().await.unwrap().unwrap();
        }
        assert_eq!(latest.total_students, 1);
        assert_eq!(latest.passed, 1);
    }
}
