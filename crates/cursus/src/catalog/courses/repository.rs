use std::collections::BTreeSet;

use async_trait::async_trait;

use super::domain::{Course, CourseCode, Program, Registration, UserId};

/// Storage abstraction over courses and programs so the service and the
/// listing pipeline can be exercised in isolation.
pub trait CatalogStore: Send + Sync {
    fn insert_course(&self, course: Course) -> Result<Course, StoreError>;
    fn update_course(&self, course: Course) -> Result<(), StoreError>;
    fn fetch_course(&self, code: &CourseCode) -> Result<Option<Course>, StoreError>;
    fn courses(&self) -> Result<Vec<Course>, StoreError>;
    fn programs(&self) -> Result<Vec<Program>, StoreError>;
}

/// Registration records, keyed by `(course, user)`.
///
/// Every write store can also answer the confirmed-registration query the
/// listing pipeline needs, hence the supertrait.
pub trait RegistrationStore: RegistrationDirectory {
    fn insert(&self, registration: Registration) -> Result<Registration, StoreError>;
    fn update(&self, registration: Registration) -> Result<(), StoreError>;
    fn fetch(&self, course: &CourseCode, user: &UserId)
        -> Result<Option<Registration>, StoreError>;
    fn for_course(&self, course: &CourseCode) -> Result<Vec<Registration>, StoreError>;
}

/// Read side consulted while building a listing filter.
///
/// The lookup is the one suspension point in the whole pipeline; its failure
/// must reach the caller untouched rather than degrade to "not registered".
#[async_trait]
pub trait RegistrationDirectory: Send + Sync {
    /// Codes of courses where `user` holds a confirmed registration, i.e. one
    /// without a pending invitation.
    async fn confirmed_courses(&self, user: &UserId) -> Result<BTreeSet<CourseCode>, DirectoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Registration lookup failure.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("registration lookup unavailable: {0}")]
    Unavailable(String),
}
