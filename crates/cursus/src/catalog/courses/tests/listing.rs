use super::common::*;
use crate::catalog::courses::domain::{Role, Visibility};
use crate::catalog::courses::listing::{
    build_filter, Derivation, ListingOptions, Participation, Predicate, StaffRole,
};
use crate::catalog::courses::repository::DirectoryError;

fn options() -> ListingOptions {
    ListingOptions::default()
}

#[tokio::test]
async fn anonymous_callers_see_the_public_published_slice() {
    let registrations = MemoryRegistrationStore::default();
    let filter = build_filter(None, &options(), &registrations)
        .await
        .expect("filter builds");

    assert!(filter.derivations.is_empty());
    assert!(filter.matches(&published_course("algebra", "alice")));

    let mut invite_only = published_course("botany", "alice");
    invite_only.visibility = Visibility::InviteOnly;
    assert!(filter.matches(&invite_only));

    let mut private = published_course("chemistry", "alice");
    private.visibility = Visibility::Private;
    assert!(!filter.matches(&private));

    assert!(!filter.matches(&course("drafts", "alice")));
    assert!(!filter.matches(&archived_course("ethics", "alice")));
}

#[tokio::test]
async fn admins_see_everything() {
    let registrations = MemoryRegistrationStore::default();
    let admin = admin("root");
    let filter = build_filter(Some(&admin), &options(), &registrations)
        .await
        .expect("filter builds");

    assert_eq!(filter.predicate, Predicate::True);

    let mut private = course("chemistry", "alice");
    private.visibility = Visibility::Private;
    assert!(filter.matches(&private));
    assert!(filter.matches(&archived_course("ethics", "alice")));
}

#[tokio::test]
async fn plain_users_do_not_see_unpublished_courses() {
    let registrations = MemoryRegistrationStore::default();
    let caller = caller("uma", &[Role::User]);
    let filter = build_filter(Some(&caller), &options(), &registrations)
        .await
        .expect("filter builds");

    assert!(filter.matches(&published_course("algebra", "alice")));
    assert!(!filter.matches(&course("drafts", "uma")));
    assert!(!filter.matches(&archived_course("ethics", "alice")));
}

#[tokio::test]
async fn teachers_see_their_own_unpublished_courses() {
    let registrations = MemoryRegistrationStore::default();
    let teacher = teacher("tessa");
    let filter = build_filter(Some(&teacher), &options(), &registrations)
        .await
        .expect("filter builds");

    assert!(filter.matches(&course("drafts", "tessa")));

    let mut assisting = course("geometry", "alice");
    assisting.teachers = vec![user("tessa")];
    assert!(filter.matches(&assisting));

    assert!(!filter.matches(&course("foreign", "alice")));
    assert!(filter.matches(&archived_course("history", "tessa")));
}

#[tokio::test]
async fn published_only_restricts_the_own_courses_alternative() {
    let registrations = MemoryRegistrationStore::default();
    let teacher = teacher("tessa");
    let listing = ListingOptions {
        published: Some(true),
        ..options()
    };
    let filter = build_filter(Some(&teacher), &listing, &registrations)
        .await
        .expect("filter builds");

    // Own drafts drop out; own courses that went through publication stay.
    assert!(!filter.matches(&course("drafts", "tessa")));
    assert!(filter.matches(&archived_course("history", "tessa")));
    assert!(filter.matches(&published_course("algebra", "alice")));
}

#[tokio::test]
async fn students_see_archived_courses_they_are_registered_in() {
    let registrations = MemoryRegistrationStore::default();
    registrations.seed(confirmed_registration("ethics", "sam"));
    let student = student("sam");
    let filter = build_filter(Some(&student), &options(), &registrations)
        .await
        .expect("filter builds");

    assert!(filter.matches(&archived_course("ethics", "alice")));
    assert!(!filter.matches(&archived_course("foreign", "alice")));
}

#[tokio::test]
async fn pending_invitations_do_not_count_as_registered() {
    let registrations = MemoryRegistrationStore::default();
    let mut pending = confirmed_registration("ethics", "sam");
    pending.invitation = Some(crate::catalog::courses::domain::Invitation::Requested);
    registrations.seed(pending);

    let student = student("sam");
    let filter = build_filter(Some(&student), &options(), &registrations)
        .await
        .expect("filter builds");

    assert!(!filter.matches(&archived_course("ethics", "alice")));
}

#[tokio::test]
async fn student_filter_narrows_to_registered_and_lifts_the_private_gate() {
    let registrations = MemoryRegistrationStore::default();
    registrations.seed(confirmed_registration("sealed", "sam"));
    let student = student("sam");
    let listing = ListingOptions {
        filter: Some(Participation::Student),
        ..options()
    };
    let filter = build_filter(Some(&student), &listing, &registrations)
        .await
        .expect("filter builds");

    let mut private = published_course("sealed", "alice");
    private.visibility = Visibility::Private;
    assert!(filter.matches(&private));

    assert!(!filter.matches(&published_course("algebra", "alice")));
}

#[tokio::test]
async fn student_filter_without_the_student_role_matches_nothing() {
    let registrations = MemoryRegistrationStore::default();
    registrations.seed(confirmed_registration("sealed", "uma"));
    let caller = caller("uma", &[Role::User]);
    let listing = ListingOptions {
        filter: Some(Participation::Student),
        ..options()
    };
    let filter = build_filter(Some(&caller), &listing, &registrations)
        .await
        .expect("filter builds");

    // The registered set was never derived for this caller.
    assert!(!filter.matches(&published_course("sealed", "alice")));
}

#[tokio::test]
async fn teacher_filter_narrows_to_staffed_courses() {
    let registrations = MemoryRegistrationStore::default();
    let teacher = teacher("tessa");
    let listing = ListingOptions {
        filter: Some(Participation::Teacher),
        ..options()
    };
    let filter = build_filter(Some(&teacher), &listing, &registrations)
        .await
        .expect("filter builds");

    let mut private = published_course("sealed", "tessa");
    private.visibility = Visibility::Private;
    assert!(filter.matches(&private));

    assert!(!filter.matches(&published_course("algebra", "alice")));
}

#[tokio::test]
async fn staff_role_narrowing_distinguishes_coordinator_from_teacher() {
    let registrations = MemoryRegistrationStore::default();
    let teacher = teacher("tessa");

    let mut assisting = published_course("geometry", "alice");
    assisting.teachers = vec![user("tessa")];
    let coordinating = published_course("algebra", "tessa");

    let listing = ListingOptions {
        role: Some(StaffRole::Coordinator),
        ..options()
    };
    let filter = build_filter(Some(&teacher), &listing, &registrations)
        .await
        .expect("filter builds");
    assert!(filter.matches(&coordinating));
    assert!(!filter.matches(&assisting));

    let listing = ListingOptions {
        role: Some(StaffRole::Teacher),
        ..options()
    };
    let filter = build_filter(Some(&teacher), &listing, &registrations)
        .await
        .expect("filter builds");
    assert!(filter.matches(&assisting));
    assert!(!filter.matches(&coordinating));
}

#[tokio::test]
async fn derivations_are_recorded_in_stage_order() {
    let registrations = MemoryRegistrationStore::default();
    let caller = caller("pat", &[Role::Student, Role::Teacher]);
    let filter = build_filter(Some(&caller), &options(), &registrations)
        .await
        .expect("filter builds");

    assert_eq!(
        filter.derivations,
        vec![
            Derivation::Coordinator,
            Derivation::Teaches,
            Derivation::Registered
        ]
    );
}

#[tokio::test]
async fn directory_failure_propagates() {
    let student = student("sam");
    let result = build_filter(Some(&student), &options(), &UnavailableDirectory).await;

    assert!(matches!(result, Err(DirectoryError::Unavailable(_))));
}

#[tokio::test]
async fn results_sort_by_creation_time_then_code() {
    let registrations = MemoryRegistrationStore::default();
    let filter = build_filter(None, &options(), &registrations)
        .await
        .expect("filter builds");

    let mut older = published_course("zoology", "alice");
    older.created_at = instant(2026, 1, 1);
    let mut newer = published_course("algebra", "alice");
    newer.created_at = instant(2026, 3, 1);
    let mut tied = published_course("botany", "alice");
    tied.created_at = instant(2026, 1, 1);

    let listed = filter.apply(vec![older, newer, tied]);
    let codes: Vec<&str> = listed.iter().map(|course| course.code.0.as_str()).collect();

    assert_eq!(codes, vec!["algebra", "botany", "zoology"]);
}

#[tokio::test]
async fn programs_list_through_the_same_filter() {
    let registrations = MemoryRegistrationStore::default();
    registrations.seed(confirmed_registration("ethics", "sam"));
    let student = student("sam");
    let filter = build_filter(Some(&student), &options(), &registrations)
        .await
        .expect("filter builds");

    let mut archived = program("humanities", "alice", &["ethics", "foreign"]);
    archived.published = Some(instant(2026, 1, 2));
    archived.archived = Some(instant(2026, 2, 1));
    assert!(filter.matches(&archived));

    let mut unrelated = program("sciences", "alice", &["physics"]);
    unrelated.published = Some(instant(2026, 1, 2));
    unrelated.archived = Some(instant(2026, 2, 1));
    assert!(!filter.matches(&unrelated));
}
