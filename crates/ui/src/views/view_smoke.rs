use lingo_core::guard::Access;
use lingo_core::model::{LessonId, Role};
use lingo_core::player::Advance;

use super::test_harness::{ADMIN, LEARNER, ViewKind, setup_view_harness};

#[tokio::test(flavor = "current_thread")]
async fn dashboard_smoke_renders_progress() {
    let mut harness = setup_view_harness(ViewKind::Dashboard, Some(LEARNER)).await;
    harness.rebuild();
    let html = harness.drive_until("Your Learning Path").await;
    assert!(html.contains("Juan dela Cruz"), "missing greeting in {html}");
    assert!(html.contains("0 of 23 lessons completed"), "missing count in {html}");
    assert!(html.contains("Continue to Lesson 1"), "missing next lesson in {html}");
    assert!(html.contains("Daily Activities"), "missing unit card in {html}");
    assert!(html.contains("Current Streak"), "missing streak card in {html}");
    assert!(html.contains("0 days"), "missing empty streak in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn dashboard_smoke_reflects_recorded_completion() {
    let mut harness = setup_view_harness(ViewKind::Dashboard, Some(LEARNER)).await;
    let user_id = harness.user_id().expect("signed in");
    let lessons = harness.services.lessons();
    let mut player = lessons
        .start_lesson(LessonId::new(1), None)
        .expect("lesson 1 is free");
    let completion = loop {
        // Any evaluated answer lets the lesson move on.
        let _ = player.select_option(0);
        let _ = player.evaluate();
        if let Advance::Completed(completion) = player.advance() {
            break completion;
        }
    };
    lessons
        .record_completion(user_id, &completion)
        .await
        .expect("record");

    harness.rebuild();
    let html = harness.drive_until("Your Learning Path").await;
    assert!(html.contains("1 of 23 lessons completed"), "missing count in {html}");
    assert!(html.contains("25"), "missing xp in {html}");
    assert!(html.contains("Continue to Lesson 2"), "missing next lesson in {html}");
    assert!(html.contains("1 day"), "missing streak in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn unit_smoke_locks_premium_for_free_plan() {
    let mut harness = setup_view_harness(ViewKind::Unit(1), Some(LEARNER)).await;
    harness.rebuild();
    let html = harness.drive_until("Your Progress").await;
    assert!(html.contains("Basics"), "missing title in {html}");
    assert!(html.contains("Upgrade to unlock"), "missing lock in {html}");
    assert!(html.contains("Start"), "missing start action in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn unit_smoke_unlocks_premium_for_paid_plan() {
    let mut harness = setup_view_harness(ViewKind::Unit(1), Some(ADMIN)).await;
    harness.rebuild();
    let html = harness.drive_until("Your Progress").await;
    assert!(!html.contains("Upgrade to unlock"), "unexpected lock in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_smoke_renders_first_step() {
    let mut harness = setup_view_harness(ViewKind::Lesson(2), Some(LEARNER)).await;
    harness.rebuild();
    let html = harness.drive_until("Step 1 of 6").await;
    assert!(html.contains("Simple Greetings"), "missing title in {html}");
    assert!(html.contains("Continue"), "missing continue in {html}");
    assert!(html.contains("Previous"), "missing previous in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_smoke_refuses_locked_lesson() {
    let mut harness = setup_view_harness(ViewKind::Lesson(5), Some(LEARNER)).await;
    harness.rebuild();
    let html = harness.drive_until("See plans").await;
    assert!(
        html.contains("part of the Basic and Premium plans"),
        "missing lock message in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_smoke_reports_missing_content() {
    let mut harness = setup_view_harness(ViewKind::Lesson(23), Some(ADMIN)).await;
    harness.rebuild();
    let html = harness.drive_until("coming soon").await;
    assert!(html.contains("This lesson is coming soon."), "missing message in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn subscribe_smoke_lists_plans_for_free_tier() {
    let mut harness = setup_view_harness(ViewKind::Subscribe, Some(LEARNER)).await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Choose Your Plan"), "missing header in {html}");
    assert!(html.contains("$4.99"), "missing basic plan in {html}");
    assert!(html.contains("Most Popular"), "missing premium ribbon in {html}");
    assert!(!html.contains("currently on the"), "unexpected banner in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn subscribe_smoke_shows_current_plan_banner() {
    let mut harness = setup_view_harness(ViewKind::Subscribe, Some(ADMIN)).await;
    harness.rebuild();
    let html = harness.render();
    assert!(
        html.contains("currently on the Premium plan"),
        "missing banner in {html}"
    );
    assert!(!html.contains("$9.99"), "unexpected plan list in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn admin_smoke_renders_catalog_tables() {
    let mut harness = setup_view_harness(ViewKind::Admin(None), Some(ADMIN)).await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Manage Lessons"), "missing lessons tab in {html}");
    assert!(html.contains("Simple Greetings"), "missing lesson row in {html}");

    let mut harness =
        setup_view_harness(ViewKind::Admin(Some("analytics".into())), Some(ADMIN)).await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Published lessons"), "missing analytics in {html}");

    let mut harness =
        setup_view_harness(ViewKind::Admin(Some("billing".into())), Some(ADMIN)).await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Unknown admin section"), "missing fallback in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn guard_renders_children_when_authorized() {
    let mut harness =
        setup_view_harness(ViewKind::Guarded(Access::Role(Role::Admin)), Some(ADMIN)).await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("secret content"), "missing children in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn login_smoke_renders_form_when_signed_out() {
    let mut harness = setup_view_harness(ViewKind::Login, None).await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Welcome Back"), "missing header in {html}");
    assert!(html.contains("Continue with Google"), "missing oauth in {html}");
    assert!(harness.links.opened.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn signup_smoke_renders_all_fields() {
    let mut harness = setup_view_harness(ViewKind::Signup, None).await;
    harness.rebuild();
    let html = harness.render();
    for label in ["Full Name", "Email Address", "Password", "Confirm Password"] {
        assert!(html.contains(label), "missing {label} in {html}");
    }
}
