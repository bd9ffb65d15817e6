use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;

use cursus::catalog::courses::domain::{Course, CourseCode, Program, Registration, UserId};
use cursus::catalog::courses::repository::{
    CatalogStore, DirectoryError, RegistrationDirectory, RegistrationStore, StoreError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCatalogStore {
    courses: Arc<Mutex<HashMap<CourseCode, Course>>>,
    programs: Arc<Mutex<Vec<Program>>>,
}

impl CatalogStore for InMemoryCatalogStore {
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
pub(crate) struct InMemoryRegistrationStore {
    records: Arc<Mutex<HashMap<(CourseCode, UserId), Registration>>>,
}

impl RegistrationStore for InMemoryRegistrationStore {
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
impl RegistrationDirectory for InMemoryRegistrationStore {
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
