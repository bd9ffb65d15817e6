//! Caller-dependent visibility filtering for courses and programs.
//!
//! [`build_filter`] turns a caller context and explicit listing options into
//! a store-agnostic predicate tree plus the ordered derivations a store must
//! join before applying it. The stage order is part of the contract: later
//! stages reference attributes derived earlier.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Caller, Course, CourseCode, Program, Role, UserId, Visibility};
use super::repository::{DirectoryError, RegistrationDirectory};

/// Explicit narrowing options a caller may pass when listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingOptions {
    /// For teachers: restrict the own-courses alternative to courses that
    /// went through publication (published and later archived).
    pub published: Option<bool>,
    /// Narrow to courses the caller participates in.
    pub filter: Option<Participation>,
    /// Narrow to courses the caller staffs in a given capacity.
    pub role: Option<StaffRole>,
}

/// Participation-scoped narrowing; also lifts the private-visibility gate,
/// since membership already establishes access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Participation {
    Student,
    Teacher,
}

/// Staff-capacity narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Coordinator,
    Teacher,
}

/// Derived attributes a store adapter must compute, in derivation order,
/// before the predicate can be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    Coordinator,
    Teaches,
    Registered,
}

/// Leaf condition over a listable record's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Published,
    NotPublished,
    Archived,
    NotArchived,
    VisibilityIsNot(Visibility),
    CoordinatorIs(UserId),
    TeachersInclude(UserId),
    RegisteredIn(BTreeSet<CourseCode>),
}

/// Store-agnostic predicate tree; adapters lower it to their native query
/// form, or evaluate it directly via [`CourseFilter::matches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    True,
    Is(Condition),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    fn matches<L: Listable + ?Sized>(&self, record: &L) -> bool {
        match self {
            Predicate::True => true,
            Predicate::Is(condition) => condition.matches(record),
            Predicate::All(parts) => parts.iter().all(|part| part.matches(record)),
            Predicate::Any(parts) => parts.iter().any(|part| part.matches(record)),
        }
    }
}

impl Condition {
    fn matches<L: Listable + ?Sized>(&self, record: &L) -> bool {
        match self {
            Condition::Published => record.is_published(),
            Condition::NotPublished => !record.is_published(),
            Condition::Archived => record.is_archived(),
            Condition::NotArchived => !record.is_archived(),
            Condition::VisibilityIsNot(visibility) => record.visibility() != *visibility,
            Condition::CoordinatorIs(user) => record.coordinator() == user,
            Condition::TeachersInclude(user) => record.teachers().contains(user),
            Condition::RegisteredIn(confirmed) => record.registered_in(confirmed),
        }
    }
}

/// Attribute view a record must expose to be listed through a filter.
pub trait Listable {
    fn is_published(&self) -> bool;
    fn is_archived(&self) -> bool;
    fn visibility(&self) -> Visibility;
    fn coordinator(&self) -> &UserId;
    fn teachers(&self) -> &[UserId];
    fn registered_in(&self, confirmed: &BTreeSet<CourseCode>) -> bool;
    fn created_at(&self) -> DateTime<Utc>;
    fn sort_code(&self) -> &str;
}

impl Listable for Course {
    fn is_published(&self) -> bool {
        self.published.is_some()
    }

    fn is_archived(&self) -> bool {
        self.archived.is_some()
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn coordinator(&self) -> &UserId {
        &self.coordinator
    }

    fn teachers(&self) -> &[UserId] {
        &self.teachers
    }

    fn registered_in(&self, confirmed: &BTreeSet<CourseCode>) -> bool {
        confirmed.contains(&self.code)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn sort_code(&self) -> &str {
        &self.code.0
    }
}

impl Listable for Program {
    fn is_published(&self) -> bool {
        self.published.is_some()
    }

    fn is_archived(&self) -> bool {
        self.archived.is_some()
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn coordinator(&self) -> &UserId {
        &self.coordinator
    }

    fn teachers(&self) -> &[UserId] {
        &[]
    }

    // A program counts as registered when any member course is.
    fn registered_in(&self, confirmed: &BTreeSet<CourseCode>) -> bool {
        self.courses.iter().any(|code| confirmed.contains(code))
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn sort_code(&self) -> &str {
        &self.code.0
    }
}

/// The assembled listing filter: derivations, predicate, and the fixed
/// result ordering (creation time descending, code ascending on ties).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFilter {
    pub derivations: Vec<Derivation>,
    pub predicate: Predicate,
}

impl CourseFilter {
    pub fn matches<L: Listable + ?Sized>(&self, record: &L) -> bool {
        self.predicate.matches(record)
    }

    /// Evaluate the predicate over already-fetched records and sort the
    /// survivors into listing order.
    pub fn apply<L: Listable>(&self, records: Vec<L>) -> Vec<L> {
        let mut matched: Vec<L> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect();
        matched.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.sort_code().cmp(b.sort_code()))
        });
        matched
    }
}

/// Build the visibility filter for a caller.
///
/// The registration directory is consulted at most once, only when the
/// caller holds the student role; that await completes before predicate
/// assembly finishes and its failure propagates untouched.
pub async fn build_filter<D>(
    caller: Option<&Caller>,
    options: &ListingOptions,
    directory: &D,
) -> Result<CourseFilter, DirectoryError>
where
    D: RegistrationDirectory + ?Sized,
{
    // Anonymous callers see the published, unarchived, non-private slice and
    // nothing else.
    let Some(caller) = caller else {
        return Ok(CourseFilter {
            derivations: Vec::new(),
            predicate: Predicate::All(vec![
                Predicate::Is(Condition::Published),
                Predicate::Is(Condition::NotArchived),
                Predicate::Is(Condition::VisibilityIsNot(Visibility::Private)),
            ]),
        });
    };

    // Derived attributes, in derivation order. The confirmed set is only
    // joined for students.
    let mut derivations = vec![Derivation::Coordinator];
    let teaches = caller.has_role(Role::Teacher);
    if teaches {
        derivations.push(Derivation::Teaches);
    }
    let confirmed = if caller.has_role(Role::Student) {
        derivations.push(Derivation::Registered);
        Some(directory.confirmed_courses(&caller.id).await?)
    } else {
        None
    };

    // Admins skip every status, visibility, and narrowing stage.
    if caller.has_role(Role::Admin) {
        return Ok(CourseFilter {
            derivations,
            predicate: Predicate::True,
        });
    }

    // Status alternatives.
    let mut status = vec![Predicate::All(vec![
        Predicate::Is(Condition::Published),
        Predicate::Is(Condition::NotArchived),
    ])];
    if teaches {
        let own = Predicate::Any(vec![
            Predicate::Is(Condition::CoordinatorIs(caller.id.clone())),
            Predicate::Is(Condition::TeachersInclude(caller.id.clone())),
        ]);
        let stage = if options.published == Some(true) {
            Predicate::All(vec![
                Predicate::Is(Condition::Published),
                Predicate::Is(Condition::Archived),
            ])
        } else {
            Predicate::Any(vec![
                Predicate::Is(Condition::NotPublished),
                Predicate::All(vec![
                    Predicate::Is(Condition::Published),
                    Predicate::Is(Condition::Archived),
                ]),
            ])
        };
        status.push(Predicate::All(vec![own, stage]));
    }
    if let Some(confirmed) = &confirmed {
        status.push(Predicate::All(vec![
            Predicate::Is(Condition::Archived),
            Predicate::Is(Condition::RegisteredIn(confirmed.clone())),
        ]));
    }
    let mut parts = vec![Predicate::Any(status)];

    // The private-visibility gate, lifted for explicit participation
    // requests.
    if options.filter.is_none() {
        parts.push(Predicate::Is(Condition::VisibilityIsNot(
            Visibility::Private,
        )));
    }

    // Participation narrowing. A student filter without the student role
    // narrows on a set that was never derived and matches nothing.
    match options.filter {
        Some(Participation::Student) => {
            parts.push(Predicate::Is(Condition::RegisteredIn(
                confirmed.clone().unwrap_or_default(),
            )));
        }
        Some(Participation::Teacher) => {
            parts.push(Predicate::Any(vec![
                Predicate::Is(Condition::CoordinatorIs(caller.id.clone())),
                Predicate::Is(Condition::TeachersInclude(caller.id.clone())),
            ]));
        }
        None => {}
    }

    // Staff-capacity narrowing.
    match options.role {
        Some(StaffRole::Coordinator) => {
            parts.push(Predicate::Is(Condition::CoordinatorIs(caller.id.clone())));
        }
        Some(StaffRole::Teacher) => {
            parts.push(Predicate::Is(Condition::TeachersInclude(caller.id.clone())));
        }
        None => {}
    }

    // Conjunction in stage order.
    Ok(CourseFilter {
        derivations,
        predicate: Predicate::All(parts),
    })
}
