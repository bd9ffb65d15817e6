//! Catalog workflows for the course-management platform.

pub mod courses;
