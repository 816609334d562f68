//! Course unlocks, progress and assignments derived from skill mastery.

use std::sync::Arc;

use mastery_engine::mastery::{
    EngineConfig, EngineError, MasteryEngine, SkillKey, SkillMasteryState,
};
use mastery_engine::progression::{
    AssignmentTemplate, CourseCatalog, CourseNode, EnrollmentStatus, ProgressionGraph,
};
use mastery_engine::store::StateStore;

mod common;

use common::{attempt, memory_engine, memory_engine_with, FlakyStore};

const ROOT: &str = "math-foundations";
const CHILD: &str = "expressions-properties";
const GRANDCHILD: &str = "ratios-proportions";

fn builtin_graph(engine: &Arc<MasteryEngine>) -> ProgressionGraph {
    ProgressionGraph::new(
        Arc::new(CourseCatalog::builtin().unwrap()),
        Arc::clone(engine),
    )
}

fn course(id: &str, parent: Option<&str>, skill: Option<&str>, sequence: Option<i32>) -> CourseNode {
    CourseNode {
        id: id.to_string(),
        title: format!("Course {id}"),
        module: None,
        summary: None,
        parent_id: parent.map(str::to_string),
        target_skill: skill.map(str::to_string),
        sequence,
        unlocked: false,
        assignment: AssignmentTemplate::default(),
    }
}

async fn set_mastery(engine: &MasteryEngine, student: &str, skill: &str, mastery: f64) {
    engine
        .store()
        .put_mastery_state(
            &SkillKey::new(student, skill),
            &SkillMasteryState::initial(mastery),
        )
        .await
        .unwrap();
}

fn status_of(
    enrollments: &[mastery_engine::progression::CourseProgress],
    id: &str,
) -> EnrollmentStatus {
    enrollments
        .iter()
        .find(|course| course.id == id)
        .map(|course| course.status)
        .unwrap()
}

#[tokio::test]
async fn fresh_student_sees_root_in_progress_and_children_locked() {
    let engine = memory_engine();
    let graph = builtin_graph(&engine);

    let enrollments = graph.compute_enrollments("S1").await.unwrap();
    assert_eq!(enrollments.len(), 3);

    let root = &enrollments[0];
    assert_eq!(root.id, ROOT);
    assert_eq!(root.status, EnrollmentStatus::InProgress);
    assert!((root.progress - 0.3).abs() < 1e-12);

    for locked in &enrollments[1..] {
        assert_eq!(locked.status, EnrollmentStatus::Locked);
        assert_eq!(locked.progress, 0.0);
    }
}

#[tokio::test]
async fn zero_prior_root_is_assigned() {
    let engine = memory_engine_with(EngineConfig {
        default_prior: 0.0,
        ..EngineConfig::default()
    });
    let graph = builtin_graph(&engine);

    let enrollments = graph.compute_enrollments("S1").await.unwrap();
    assert_eq!(status_of(&enrollments, ROOT), EnrollmentStatus::Assigned);
}

#[tokio::test]
async fn child_unlocks_only_at_full_parent_mastery() {
    let engine = memory_engine();
    let graph = builtin_graph(&engine);

    set_mastery(&engine, "S1", "6.EE.A.1", 0.999).await;
    let enrollments = graph.compute_enrollments("S1").await.unwrap();
    assert_eq!(status_of(&enrollments, CHILD), EnrollmentStatus::Locked);

    set_mastery(&engine, "S1", "6.EE.A.1", 1.0).await;
    let report = graph.sync("S1").await.unwrap();
    assert!(report.unlocked.contains(CHILD));
    assert!(report.completed.contains(ROOT));
    assert_eq!(status_of(&report.enrollments, ROOT), EnrollmentStatus::Completed);
    assert_eq!(status_of(&report.enrollments, CHILD), EnrollmentStatus::InProgress);
    assert_eq!(status_of(&report.enrollments, GRANDCHILD), EnrollmentStatus::Locked);
}

#[tokio::test]
async fn unlocked_course_never_relocks() {
    let engine = memory_engine();
    let graph = builtin_graph(&engine);

    set_mastery(&engine, "S1", "6.EE.A.1", 1.0).await;
    graph.sync("S1").await.unwrap();

    set_mastery(&engine, "S1", "6.EE.A.1", 0.4).await;
    let enrollments = graph.compute_enrollments("S1").await.unwrap();
    assert_eq!(status_of(&enrollments, CHILD), EnrollmentStatus::InProgress);
    assert_eq!(status_of(&enrollments, ROOT), EnrollmentStatus::InProgress);
}

#[tokio::test]
async fn unlocks_are_reported_once() {
    let engine = memory_engine();
    let graph = builtin_graph(&engine);

    set_mastery(&engine, "S1", "6.EE.A.1", 1.0).await;
    let first = graph.compute_unlocks("S1").await.unwrap();
    assert_eq!(first.into_iter().collect::<Vec<_>>(), vec![CHILD.to_string()]);

    let second = graph.compute_unlocks("S1").await.unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn failed_pass_stores_nothing_and_unlock_is_reported_later() {
    let store = Arc::new(FlakyStore::default());
    let engine = Arc::new(MasteryEngine::new(EngineConfig::default(), store.clone()));
    let graph = builtin_graph(&engine);
    set_mastery(&engine, "S1", "6.EE.A.1", 1.0).await;

    // Room for two of the three enrollment records.
    *store.enrollment_budget.lock() = Some(2);
    let err = graph.compute_unlocks("S1").await.unwrap_err();
    assert!(matches!(err, EngineError::StoreUnavailable(_)));
    assert!(store.get_enrollments("S1").await.unwrap().is_empty());

    *store.enrollment_budget.lock() = None;
    let unlocked = graph.compute_unlocks("S1").await.unwrap();
    assert!(unlocked.contains(CHILD));
    assert_eq!(store.get_enrollments("S1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn chain_unlocks_level_by_level() {
    let engine = memory_engine();
    let graph = builtin_graph(&engine);

    set_mastery(&engine, "S1", "6.EE.A.1", 1.0).await;
    set_mastery(&engine, "S1", "6.EE.A.3", 1.0).await;
    let report = graph.sync("S1").await.unwrap();

    assert!(report.unlocked.contains(CHILD));
    assert!(report.unlocked.contains(GRANDCHILD));
    assert_eq!(status_of(&report.enrollments, CHILD), EnrollmentStatus::Completed);
    assert_eq!(status_of(&report.enrollments, GRANDCHILD), EnrollmentStatus::InProgress);
}

#[tokio::test]
async fn students_progress_independently() {
    let engine = memory_engine();
    let graph = builtin_graph(&engine);

    set_mastery(&engine, "S1", "6.EE.A.1", 1.0).await;
    graph.sync("S1").await.unwrap();

    let other = graph.compute_enrollments("S2").await.unwrap();
    assert_eq!(status_of(&other, CHILD), EnrollmentStatus::Locked);
}

#[tokio::test]
async fn course_without_target_skill_has_no_progress() {
    let catalog = CourseCatalog::new(vec![course("orientation", None, None, Some(1))]).unwrap();
    let engine = memory_engine();
    let graph = ProgressionGraph::new(Arc::new(catalog), Arc::clone(&engine));

    let enrollments = graph.compute_enrollments("S1").await.unwrap();
    assert_eq!(enrollments[0].progress, 0.0);
    assert_eq!(enrollments[0].status, EnrollmentStatus::Assigned);
}

#[tokio::test]
async fn child_of_skillless_parent_stays_locked() {
    let catalog = CourseCatalog::new(vec![
        course("orientation", None, None, Some(1)),
        course("algebra", Some("orientation"), Some("A.1"), Some(2)),
    ])
    .unwrap();
    let graph = ProgressionGraph::new(Arc::new(catalog), memory_engine());

    let enrollments = graph.compute_enrollments("S1").await.unwrap();
    assert_eq!(status_of(&enrollments, "algebra"), EnrollmentStatus::Locked);
}

#[tokio::test]
async fn flagged_child_starts_unlocked() {
    let mut bonus = course("bonus", Some("root"), Some("B.1"), Some(2));
    bonus.unlocked = true;
    let catalog = CourseCatalog::new(vec![course("root", None, Some("A.1"), Some(1)), bonus]).unwrap();
    let graph = ProgressionGraph::new(Arc::new(catalog), memory_engine());

    let report = graph.sync("S1").await.unwrap();
    assert_eq!(status_of(&report.enrollments, "bonus"), EnrollmentStatus::InProgress);
    assert!(report.unlocked.is_empty());
}

#[tokio::test]
async fn enrollments_follow_display_order() {
    let mut beta = course("beta", None, Some("K.2"), None);
    beta.title = "Beta".into();
    let mut alpha = course("alpha", None, Some("K.1"), None);
    alpha.title = "Alpha".into();
    let catalog = CourseCatalog::new(vec![
        beta,
        course("second", None, Some("K.3"), Some(2)),
        alpha,
        course("first", None, Some("K.4"), Some(1)),
    ])
    .unwrap();
    let graph = ProgressionGraph::new(Arc::new(catalog), memory_engine());

    let ids: Vec<_> = graph
        .compute_enrollments("S1")
        .await
        .unwrap()
        .into_iter()
        .map(|course| course.id)
        .collect();
    assert_eq!(ids, vec!["first", "second", "alpha", "beta"]);
}

#[tokio::test]
async fn assignments_mirror_enrollments() {
    let engine = memory_engine();
    let graph = builtin_graph(&engine);

    let enrollments = graph.compute_enrollments("S1").await.unwrap();
    let assignments = graph.compute_assignments("S1").await.unwrap();
    assert_eq!(assignments.len(), enrollments.len());

    for (assignment, enrollment) in assignments.iter().zip(&enrollments) {
        assert_eq!(assignment.course_id, enrollment.id);
        assert_eq!(assignment.id, format!("S1:{}", enrollment.id));
        assert_eq!(assignment.status, enrollment.status);
        assert_eq!(assignment.completion_rate, enrollment.progress);
    }

    let counts: Vec<_> = assignments.iter().map(|a| a.problem_count).collect();
    assert_eq!(counts, vec![12, 15, 18]);
    assert_eq!(assignments[0].skills, vec!["6.EE.A.1".to_string()]);
    assert_eq!(assignments[0].assignment_type, "Skill Builder");
}

#[tokio::test]
async fn assignment_defaults_fill_missing_template() {
    let catalog = CourseCatalog::new(vec![course("geo", None, Some("G.1"), Some(1))]).unwrap();
    let graph = ProgressionGraph::new(Arc::new(catalog), memory_engine());

    let assignments = graph.compute_assignments("S1").await.unwrap();
    assert_eq!(assignments[0].name, "Course geo Practice");
    assert_eq!(assignments[0].assignment_type, "Practice");
    assert_eq!(assignments[0].problem_count, 10);
}

#[tokio::test]
async fn practice_drives_unlock_end_to_end() {
    let engine = memory_engine();
    let graph = builtin_graph(&engine);

    let mut mastered = false;
    for _ in 0..50 {
        let snapshot = engine
            .submit_attempt(&attempt("S1", "6.EE.A.1", true, 1))
            .await
            .unwrap();
        if snapshot.mastery == 1.0 {
            mastered = true;
            break;
        }
    }
    assert!(mastered, "snap threshold never reached");

    let unlocked = graph.compute_unlocks("S1").await.unwrap();
    assert!(unlocked.contains(CHILD));
}

#[tokio::test]
async fn blank_student_is_rejected() {
    let graph = builtin_graph(&memory_engine());
    let err = graph.compute_enrollments("  ").await.unwrap_err();
    assert!(err.is_validation());
}
