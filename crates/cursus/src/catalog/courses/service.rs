use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Caller, Course, CourseCode, CourseStatus, Invitation, Program, Registration, Role, Timeline,
    UserId, Visibility,
};
use super::listing::{build_filter, ListingOptions};
use super::repository::{CatalogStore, DirectoryError, RegistrationStore, StoreError};
use super::schedule::{self, Invalidation};

/// Service composing the schedule validator, eligibility gates, and listing
/// pipeline over the two stores.
pub struct CourseCatalogService<S, R> {
    courses: Arc<S>,
    registrations: Arc<R>,
}

/// Payload for creating a course; markers start unset and the timeline is
/// validated before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub code: CourseCode,
    pub name: String,
    pub coordinator: UserId,
    #[serde(default)]
    pub teachers: Vec<UserId>,
    pub visibility: Visibility,
    #[serde(default)]
    pub timeline: Option<Timeline>,
}

/// Payload for editing a course. The editable fields are replaced wholesale;
/// in particular an absent timeline removes the existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEdit {
    pub name: String,
    #[serde(default)]
    pub teachers: Vec<UserId>,
    pub visibility: Visibility,
    #[serde(default)]
    pub timeline: Option<Timeline>,
}

/// Field-level schedule violations that blocked a create or edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRejection {
    pub invalidations: Vec<Invalidation>,
}

impl fmt::Display for ScheduleRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timeline failed {} ordering check(s)",
            self.invalidations.len()
        )
    }
}

/// Error raised by the catalog service.
#[derive(Debug, thiserror::Error)]
pub enum CatalogServiceError {
    #[error("course timeline is inconsistent: {0}")]
    Schedule(ScheduleRejection),
    #[error("course not found")]
    UnknownCourse,
    #[error("registration not found")]
    UnknownRegistration,
    #[error("a registration for this course already exists")]
    AlreadyRegistered,
    #[error("action not currently permitted")]
    NotCurrentlyPermitted,
    #[error("caller may not perform this action")]
    Forbidden,
    #[error("course does not accept this kind of registration")]
    NotEnrollable,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl<S, R> CourseCatalogService<S, R>
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    pub fn new(courses: Arc<S>, registrations: Arc<R>) -> Self {
        Self {
            courses,
            registrations,
        }
    }

    /// Create a course. A declared timeline must pass every ordering check
    /// before the course is persisted.
    pub fn create_course(
        &self,
        caller: &Caller,
        draft: CourseDraft,
        now: DateTime<Utc>,
    ) -> Result<Course, CatalogServiceError> {
        if !can_manage_catalog(caller) {
            return Err(CatalogServiceError::Forbidden);
        }
        if let Some(timeline) = &draft.timeline {
            reject_inconsistent(timeline)?;
        }

        let course = Course {
            code: draft.code,
            name: draft.name,
            coordinator: draft.coordinator,
            teachers: draft.teachers,
            visibility: draft.visibility,
            timeline: draft.timeline,
            published: None,
            archived: None,
            created_at: now,
        };
        let stored = self.courses.insert_course(course)?;
        Ok(stored)
    }

    /// Edit a course, replacing the editable fields wholesale. A replaced
    /// timeline goes through the full rule set again.
    pub fn update_course(
        &self,
        caller: &Caller,
        code: &CourseCode,
        edit: CourseEdit,
    ) -> Result<Course, CatalogServiceError> {
        let mut course = self.fetch_course(code)?;
        if !can_edit_course(caller, &course) {
            return Err(CatalogServiceError::Forbidden);
        }
        if let Some(timeline) = &edit.timeline {
            reject_inconsistent(timeline)?;
        }

        course.name = edit.name;
        course.teachers = edit.teachers;
        course.visibility = edit.visibility;
        course.timeline = edit.timeline;
        self.courses.update_course(course.clone())?;
        Ok(course)
    }

    /// Stamp the published marker. Archived courses stay archived.
    pub fn publish_course(
        &self,
        caller: &Caller,
        code: &CourseCode,
        now: DateTime<Utc>,
    ) -> Result<Course, CatalogServiceError> {
        let mut course = self.fetch_course(code)?;
        if !can_edit_course(caller, &course) {
            return Err(CatalogServiceError::Forbidden);
        }
        if course.archived.is_some() {
            return Err(CatalogServiceError::Forbidden);
        }
        if course.published.is_none() {
            course.published = Some(now);
            self.courses.update_course(course.clone())?;
        }
        Ok(course)
    }

    /// Stamp the archived marker on a published course.
    pub fn archive_course(
        &self,
        caller: &Caller,
        code: &CourseCode,
        now: DateTime<Utc>,
    ) -> Result<Course, CatalogServiceError> {
        let mut course = self.fetch_course(code)?;
        if !can_edit_course(caller, &course) {
            return Err(CatalogServiceError::Forbidden);
        }
        if course.published.is_none() {
            return Err(CatalogServiceError::Forbidden);
        }
        if course.archived.is_none() {
            course.archived = Some(now);
            self.courses.update_course(course.clone())?;
        }
        Ok(course)
    }

    /// List the courses visible to the caller, in listing order.
    pub async fn list_courses(
        &self,
        caller: Option<&Caller>,
        options: &ListingOptions,
    ) -> Result<Vec<Course>, CatalogServiceError> {
        let filter = build_filter(caller, options, self.registrations.as_ref()).await?;
        let records = self.courses.courses()?;
        Ok(filter.apply(records))
    }

    /// List the programs visible to the caller, under the same filter rules.
    pub async fn list_programs(
        &self,
        caller: Option<&Caller>,
        options: &ListingOptions,
    ) -> Result<Vec<Program>, CatalogServiceError> {
        let filter = build_filter(caller, options, self.registrations.as_ref()).await?;
        let records = self.courses.programs()?;
        Ok(filter.apply(records))
    }

    /// Enroll directly into a public, published course. The eligibility gate
    /// runs before any write.
    pub fn enroll(
        &self,
        caller: &Caller,
        code: &CourseCode,
        now: DateTime<Utc>,
    ) -> Result<Registration, CatalogServiceError> {
        let course = self.fetch_course(code)?;
        if course.status() != CourseStatus::Published {
            return Err(CatalogServiceError::NotEnrollable);
        }
        if course.visibility != Visibility::Public {
            return Err(CatalogServiceError::NotEnrollable);
        }
        if self.registrations.fetch(code, &caller.id)?.is_some() {
            return Err(CatalogServiceError::AlreadyRegistered);
        }
        if !schedule::can_enroll(course.timeline.as_ref(), now) {
            return Err(CatalogServiceError::NotCurrentlyPermitted);
        }

        let registration = Registration {
            user: caller.id.clone(),
            course: code.clone(),
            group: None,
            invitation: None,
            created_at: now,
        };
        let stored = self.registrations.insert(registration)?;
        Ok(stored)
    }

    /// Ask to join an invite-only course. Shares the enrollment gate.
    pub fn request_invitation(
        &self,
        caller: &Caller,
        code: &CourseCode,
        now: DateTime<Utc>,
    ) -> Result<Registration, CatalogServiceError> {
        let course = self.fetch_course(code)?;
        if course.status() != CourseStatus::Published {
            return Err(CatalogServiceError::NotEnrollable);
        }
        if course.visibility != Visibility::InviteOnly {
            return Err(CatalogServiceError::NotEnrollable);
        }
        if self.registrations.fetch(code, &caller.id)?.is_some() {
            return Err(CatalogServiceError::AlreadyRegistered);
        }
        if !schedule::can_enroll(course.timeline.as_ref(), now) {
            return Err(CatalogServiceError::NotCurrentlyPermitted);
        }

        let registration = Registration {
            user: caller.id.clone(),
            course: code.clone(),
            group: None,
            invitation: Some(Invitation::Requested),
            created_at: now,
        };
        let stored = self.registrations.insert(registration)?;
        Ok(stored)
    }

    /// Pending invitation requests for a course, for the coordinator's queue.
    pub fn pending_invitations(
        &self,
        caller: &Caller,
        code: &CourseCode,
    ) -> Result<Vec<Registration>, CatalogServiceError> {
        let course = self.fetch_course(code)?;
        if !can_edit_course(caller, &course) {
            return Err(CatalogServiceError::Forbidden);
        }
        let registrations = self.registrations.for_course(code)?;
        Ok(registrations
            .into_iter()
            .filter(|registration| !registration.is_confirmed())
            .collect())
    }

    /// Confirm a pending invitation, the registration's one-time transition.
    /// Only the coordinator (or catalog staff) may confirm.
    pub fn confirm_invitation(
        &self,
        caller: &Caller,
        code: &CourseCode,
        user: &UserId,
    ) -> Result<Registration, CatalogServiceError> {
        let course = self.fetch_course(code)?;
        if !can_edit_course(caller, &course) {
            return Err(CatalogServiceError::Forbidden);
        }
        let mut registration = self
            .registrations
            .fetch(code, user)?
            .ok_or(CatalogServiceError::UnknownRegistration)?;
        if registration.is_confirmed() {
            return Err(CatalogServiceError::AlreadyRegistered);
        }

        registration.invitation = None;
        self.registrations.update(registration.clone())?;
        Ok(registration)
    }

    /// Change the caller's group assignment while the group window is open.
    pub fn update_group(
        &self,
        caller: &Caller,
        code: &CourseCode,
        group: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Registration, CatalogServiceError> {
        let course = self.fetch_course(code)?;
        let mut registration = self
            .registrations
            .fetch(code, &caller.id)?
            .ok_or(CatalogServiceError::UnknownRegistration)?;
        if !registration.is_confirmed() {
            return Err(CatalogServiceError::Forbidden);
        }
        if !schedule::can_update_group(course.timeline.as_ref(), now) {
            return Err(CatalogServiceError::NotCurrentlyPermitted);
        }

        registration.group = group;
        self.registrations.update(registration.clone())?;
        Ok(registration)
    }

    fn fetch_course(&self, code: &CourseCode) -> Result<Course, CatalogServiceError> {
        self.courses
            .fetch_course(code)?
            .ok_or(CatalogServiceError::UnknownCourse)
    }
}

fn reject_inconsistent(timeline: &Timeline) -> Result<(), CatalogServiceError> {
    let invalidations = schedule::validate(timeline);
    if invalidations.is_empty() {
        Ok(())
    } else {
        Err(CatalogServiceError::Schedule(ScheduleRejection {
            invalidations,
        }))
    }
}

fn can_manage_catalog(caller: &Caller) -> bool {
    caller.has_role(Role::Teacher) || caller.has_role(Role::Manager) || caller.has_role(Role::Admin)
}

fn can_edit_course(caller: &Caller, course: &Course) -> bool {
    course.is_coordinator(&caller.id)
        || caller.has_role(Role::Manager)
        || caller.has_role(Role::Admin)
}
