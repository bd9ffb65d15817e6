//! Course scheduling, eligibility, and caller-dependent catalog visibility.
//!
//! The module is built around three pure components: the schedule validator
//! (field-level timeline consistency), the eligibility policy (time-gated
//! enrollment and group changes), and the listing filter builder (the
//! role- and status-dependent predicate tree). The service composes them
//! over store traits; the router exposes them over HTTP.

pub mod domain;
pub mod listing;
pub mod repository;
pub mod router;
pub mod schedule;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Caller, Course, CourseCode, CourseStatus, Invitation, Program, ProgramCode, Registration,
    Role, RoleSet, Timeline, UserId, Visibility,
};
pub use listing::{
    build_filter, Condition, CourseFilter, Derivation, Listable, ListingOptions, Participation,
    Predicate, StaffRole,
};
pub use repository::{
    CatalogStore, DirectoryError, RegistrationDirectory, RegistrationStore, StoreError,
};
pub use router::catalog_router;
pub use schedule::{can_enroll, can_update_group, validate, Invalidation, TimelineField};
pub use service::{
    CatalogServiceError, CourseCatalogService, CourseDraft, CourseEdit, ScheduleRejection,
};
