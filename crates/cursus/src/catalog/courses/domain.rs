use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for platform users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique course code, the public identity of a course.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseCode(pub String);

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique program code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramCode(pub String);

/// The six-instant scheduling record embedded in a course.
///
/// Every field is independent and optional; an absent field asserts no
/// constraint. The record is replaced wholesale on edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timeline {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub registrations_start: Option<DateTime<Utc>>,
    pub registrations_end: Option<DateTime<Utc>>,
    pub evaluation_requests_end: Option<DateTime<Utc>>,
    pub evaluations_end: Option<DateTime<Utc>>,
}

/// Listing scope of a course or program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    InviteOnly,
    Private,
}

/// Derived lifecycle stage; never stored, always computed from the markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Unpublished,
    Published,
    Archived,
}

impl CourseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CourseStatus::Unpublished => "unpublished",
            CourseStatus::Published => "published",
            CourseStatus::Archived => "archived",
        }
    }
}

/// A course as the catalog sees it: identity, schedule, and listing markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: CourseCode,
    pub name: String,
    pub coordinator: UserId,
    #[serde(default)]
    pub teachers: Vec<UserId>,
    pub visibility: Visibility,
    #[serde(default)]
    pub timeline: Option<Timeline>,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn status(&self) -> CourseStatus {
        if self.archived.is_some() {
            CourseStatus::Archived
        } else if self.published.is_some() {
            CourseStatus::Published
        } else {
            CourseStatus::Unpublished
        }
    }

    pub fn is_coordinator(&self, user: &UserId) -> bool {
        self.coordinator == *user
    }

    pub fn is_teacher(&self, user: &UserId) -> bool {
        self.teachers.contains(user)
    }
}

/// A program groups courses and is listed with the same visibility rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub code: ProgramCode,
    pub name: String,
    pub coordinator: UserId,
    pub visibility: Visibility,
    #[serde(default)]
    pub courses: Vec<CourseCode>,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Pending sub-state of a registration; absence means confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Invitation {
    Requested,
    Sent,
}

/// Links one user to one course, at most once per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub user: UserId,
    pub course: CourseCode,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub invitation: Option<Invitation>,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn is_confirmed(&self) -> bool {
        self.invitation.is_none()
    }
}

/// Platform roles granted to a caller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Student,
    Teacher,
    Manager,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Typed role set with membership queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(roles: &[Role]) -> Self {
        roles.iter().copied().collect()
    }

    pub fn insert(&mut self, role: Role) {
        self.0.insert(role);
    }

    pub fn has(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Authenticated caller: identity plus granted roles.
///
/// An anonymous caller is modeled as `Option<Caller>::None` at the seams
/// that accept one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: UserId,
    pub roles: RoleSet,
}

impl Caller {
    pub fn new(id: UserId, roles: RoleSet) -> Self {
        Self { id, roles }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.has(role)
    }
}
