use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::catalog::courses::domain::{
    Caller, Course, CourseCode, Program, ProgramCode, Registration, Role, RoleSet, Timeline,
    UserId, Visibility,
};
use crate::catalog::courses::repository::{
    CatalogStore, DirectoryError, RegistrationDirectory, RegistrationStore, StoreError,
};
use crate::catalog::courses::router::catalog_router;
use crate::catalog::courses::service::CourseCatalogService;

pub(super) fn instant(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

pub(super) fn caller(id: &str, roles: &[Role]) -> Caller {
    Caller::new(user(id), RoleSet::of(roles))
}

pub(super) fn student(id: &str) -> Caller {
    caller(id, &[Role::User, Role::Student])
}

pub(super) fn teacher(id: &str) -> Caller {
    caller(id, &[Role::User, Role::Teacher])
}

pub(super) fn manager(id: &str) -> Caller {
    caller(id, &[Role::User, Role::Manager])
}

pub(super) fn admin(id: &str) -> Caller {
    caller(id, &[Role::User, Role::Admin])
}

/// Consistent four-field timeline: registrations Jan 1..Jan 10, course runs
/// Jan 5..Dec 31, no evaluation phase.
pub(super) fn valid_timeline() -> Timeline {
    Timeline {
        registrations_start: Some(instant(2026, 1, 1)),
        start: Some(instant(2026, 1, 5)),
        registrations_end: Some(instant(2026, 1, 10)),
        end: Some(instant(2026, 12, 31)),
        ..Timeline::default()
    }
}

/// Consistent timeline with all six fields set.
pub(super) fn full_timeline() -> Timeline {
    Timeline {
        registrations_start: Some(instant(2026, 1, 1)),
        start: Some(instant(2026, 1, 5)),
        registrations_end: Some(instant(2026, 1, 10)),
        evaluation_requests_end: Some(instant(2026, 6, 1)),
        end: Some(instant(2026, 6, 30)),
        evaluations_end: Some(instant(2026, 7, 15)),
    }
}

pub(super) fn course(code: &str, coordinator: &str) -> Course {
    Course {
        code: CourseCode(code.to_string()),
        name: format!("Course {code}"),
        coordinator: user(coordinator),
        teachers: Vec::new(),
        visibility: Visibility::Public,
        timeline: None,
        published: None,
        archived: None,
        created_at: instant(2026, 1, 1),
    }
}

pub(super) fn published_course(code: &str, coordinator: &str) -> Course {
    let mut course = course(code, coordinator);
    course.published = Some(instant(2026, 1, 2));
    course
}

pub(super) fn archived_course(code: &str, coordinator: &str) -> Course {
    let mut course = published_course(code, coordinator);
    course.archived = Some(instant(2026, 2, 1));
    course
}

pub(super) fn program(code: &str, coordinator: &str, courses: &[&str]) -> Program {
    Program {
        code: ProgramCode(code.to_string()),
        name: format!("Program {code}"),
        coordinator: user(coordinator),
        visibility: Visibility::Public,
        courses: courses
            .iter()
            .map(|course| CourseCode(course.to_string()))
            .collect(),
        published: None,
        archived: None,
        created_at: instant(2026, 1, 1),
    }
}

pub(super) fn confirmed_registration(code: &str, id: &str) -> Registration {
    Registration {
        user: user(id),
        course: CourseCode(code.to_string()),
        group: None,
        invitation: None,
        created_at: instant(2026, 1, 6),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalogStore {
    courses: Arc<Mutex<HashMap<CourseCode, Course>>>,
    programs: Arc<Mutex<Vec<Program>>>,
}

impl MemoryCatalogStore {
    pub(super) fn seed_course(&self, course: Course) {
        self.courses
            .lock()
            .expect("catalog mutex poisoned")
            .insert(course.code.clone(), course);
    }

    pub(super) fn seed_program(&self, program: Program) {
        self.programs
            .lock()
            .expect("catalog mutex poisoned")
            .push(program);
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn insert_course(&self, course: Course) -> Result<Course, StoreError> {
        let mut guard = self.courses.lock().expect("catalog mutex poisoned");
        if guard.contains_key(&course.code) {
            return Err(StoreError::Conflict);
        }
        guard.insert(course.code.clone(), course.clone());
        Ok(course)
    }

    fn update_course(&self, course: Course) -> Result<(), StoreError> {
        let mut guard = self.courses.lock().expect("catalog mutex poisoned");
        if guard.contains_key(&course.code) {
            guard.insert(course.code.clone(), course);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn fetch_course(&self, code: &CourseCode) -> Result<Option<Course>, StoreError> {
        let guard = self.courses.lock().expect("catalog mutex poisoned");
        Ok(guard.get(code).cloned())
    }

    fn courses(&self) -> Result<Vec<Course>, StoreError> {
        let guard = self.courses.lock().expect("catalog mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn programs(&self) -> Result<Vec<Program>, StoreError> {
        let guard = self.programs.lock().expect("catalog mutex poisoned");
        Ok(guard.clone())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRegistrationStore {
    records: Arc<Mutex<HashMap<(CourseCode, UserId), Registration>>>,
}

impl MemoryRegistrationStore {
    pub(super) fn seed(&self, registration: Registration) {
        self.records
            .lock()
            .expect("registration mutex poisoned")
            .insert(
                (registration.course.clone(), registration.user.clone()),
                registration,
            );
    }
}

impl RegistrationStore for MemoryRegistrationStore {
    fn insert(&self, registration: Registration) -> Result<Registration, StoreError> {
        let mut guard = self.records.lock().expect("registration mutex poisoned");
        let key = (registration.course.clone(), registration.user.clone());
        if guard.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        guard.insert(key, registration.clone());
        Ok(registration)
    }

    fn update(&self, registration: Registration) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("registration mutex poisoned");
        let key = (registration.course.clone(), registration.user.clone());
        if guard.contains_key(&key) {
            guard.insert(key, registration);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn fetch(
        &self,
        course: &CourseCode,
        user: &UserId,
    ) -> Result<Option<Registration>, StoreError> {
        let guard = self.records.lock().expect("registration mutex poisoned");
        Ok(guard.get(&(course.clone(), user.clone())).cloned())
    }

    fn for_course(&self, course: &CourseCode) -> Result<Vec<Registration>, StoreError> {
        let guard = self.records.lock().expect("registration mutex poisoned");
        Ok(guard
            .values()
            .filter(|registration| registration.course == *course)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RegistrationDirectory for MemoryRegistrationStore {
    async fn confirmed_courses(
        &self,
        user: &UserId,
    ) -> Result<BTreeSet<CourseCode>, DirectoryError> {
        let guard = self.records.lock().expect("registration mutex poisoned");
        Ok(guard
            .values()
            .filter(|registration| registration.user == *user && registration.is_confirmed())
            .map(|registration| registration.course.clone())
            .collect())
    }
}

/// Directory double whose lookup always fails, for propagation tests.
pub(super) struct UnavailableDirectory;

impl RegistrationStore for UnavailableDirectory {
    fn insert(&self, _registration: Registration) -> Result<Registration, StoreError> {
        Err(StoreError::Unavailable("registrations offline".to_string()))
    }

    fn update(&self, _registration: Registration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("registrations offline".to_string()))
    }

    fn fetch(
        &self,
        _course: &CourseCode,
        _user: &UserId,
    ) -> Result<Option<Registration>, StoreError> {
        Err(StoreError::Unavailable("registrations offline".to_string()))
    }

    fn for_course(&self, _course: &CourseCode) -> Result<Vec<Registration>, StoreError> {
        Err(StoreError::Unavailable("registrations offline".to_string()))
    }
}

#[async_trait]
impl RegistrationDirectory for UnavailableDirectory {
    async fn confirmed_courses(
        &self,
        _user: &UserId,
    ) -> Result<BTreeSet<CourseCode>, DirectoryError> {
        Err(DirectoryError::Unavailable(
            "registrations offline".to_string(),
        ))
    }
}

pub(super) fn build_service() -> (
    CourseCatalogService<MemoryCatalogStore, MemoryRegistrationStore>,
    Arc<MemoryCatalogStore>,
    Arc<MemoryRegistrationStore>,
) {
    let courses = Arc::new(MemoryCatalogStore::default());
    let registrations = Arc::new(MemoryRegistrationStore::default());
    let service = CourseCatalogService::new(courses.clone(), registrations.clone());
    (service, courses, registrations)
}

pub(super) fn catalog_router_with_service(
    service: CourseCatalogService<MemoryCatalogStore, MemoryRegistrationStore>,
) -> axum::Router {
    catalog_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
