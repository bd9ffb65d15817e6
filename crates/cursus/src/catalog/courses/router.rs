use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Caller, CourseCode, Role, RoleSet, UserId};
use super::listing::ListingOptions;
use super::repository::{CatalogStore, RegistrationStore, StoreError};
use super::service::{CatalogServiceError, CourseCatalogService, CourseDraft, CourseEdit};

/// Router builder exposing the catalog's HTTP endpoints.
///
/// Authentication stays external: the caller identity and role set are read
/// from headers a fronting gateway is expected to have verified.
pub fn catalog_router<S, R>(service: Arc<CourseCatalogService<S, R>>) -> Router
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/courses",
            get(list_courses_handler::<S, R>).post(create_course_handler::<S, R>),
        )
        .route("/api/v1/courses/:code", put(update_course_handler::<S, R>))
        .route(
            "/api/v1/courses/:code/publish",
            post(publish_course_handler::<S, R>),
        )
        .route(
            "/api/v1/courses/:code/archive",
            post(archive_course_handler::<S, R>),
        )
        .route(
            "/api/v1/courses/:code/registrations",
            post(enroll_handler::<S, R>),
        )
        .route(
            "/api/v1/courses/:code/invitations",
            get(pending_invitations_handler::<S, R>).post(request_invitation_handler::<S, R>),
        )
        .route(
            "/api/v1/courses/:code/invitations/confirm",
            post(confirm_invitation_handler::<S, R>),
        )
        .route("/api/v1/courses/:code/group", put(update_group_handler::<S, R>))
        .route("/api/v1/programs", get(list_programs_handler::<S, R>))
        .with_state(service)
}

/// Optional instant override so mutations stay reproducible in tests and
/// demos; absent means the wall clock.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct MutationMoment {
    pub(crate) now: Option<DateTime<Utc>>,
}

impl MutationMoment {
    fn resolve(self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfirmInvitationRequest {
    pub(crate) user: UserId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct UpdateGroupRequest {
    pub(crate) group: Option<String>,
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn caller_from_headers(headers: &HeaderMap) -> Option<Caller> {
    let id = headers.get("x-user-id")?.to_str().ok()?.trim();
    if id.is_empty() {
        return None;
    }
    let roles: RoleSet = headers
        .get("x-user-roles")
        .and_then(|value| value.to_str().ok())
        .map(|raw| raw.split(',').filter_map(Role::parse).collect())
        .unwrap_or_default();
    Some(Caller::new(UserId(id.to_string()), roles))
}

fn require_caller(headers: &HeaderMap) -> Result<Caller, Response> {
    caller_from_headers(headers).ok_or_else(|| {
        let payload = json!({ "error": "authentication required" });
        (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
    })
}

fn error_response(error: CatalogServiceError) -> Response {
    match error {
        CatalogServiceError::Schedule(rejection) => {
            let payload = json!({ "errors": rejection.invalidations });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        CatalogServiceError::UnknownCourse | CatalogServiceError::UnknownRegistration => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        CatalogServiceError::AlreadyRegistered | CatalogServiceError::Store(StoreError::Conflict) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        CatalogServiceError::NotCurrentlyPermitted
        | CatalogServiceError::Forbidden
        | CatalogServiceError::NotEnrollable => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn create_course_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<CourseDraft>,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = match require_caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match service.create_course(&caller, draft, Utc::now()) {
        Ok(course) => (StatusCode::CREATED, axum::Json(course)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_course_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    axum::Json(edit): axum::Json<CourseEdit>,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = match require_caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match service.update_course(&caller, &CourseCode(code), edit) {
        Ok(course) => (StatusCode::OK, axum::Json(course)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn publish_course_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    moment: Option<axum::Json<MutationMoment>>,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = match require_caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    let now = moment.map(|axum::Json(m)| m).unwrap_or_default().resolve();
    match service.publish_course(&caller, &CourseCode(code), now) {
        Ok(course) => (StatusCode::OK, axum::Json(course)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn archive_course_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    moment: Option<axum::Json<MutationMoment>>,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = match require_caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    let now = moment.map(|axum::Json(m)| m).unwrap_or_default().resolve();
    match service.archive_course(&caller, &CourseCode(code), now) {
        Ok(course) => (StatusCode::OK, axum::Json(course)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_courses_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    Query(options): Query<ListingOptions>,
    headers: HeaderMap,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = caller_from_headers(&headers);
    match service.list_courses(caller.as_ref(), &options).await {
        Ok(courses) => (StatusCode::OK, axum::Json(courses)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_programs_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    Query(options): Query<ListingOptions>,
    headers: HeaderMap,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = caller_from_headers(&headers);
    match service.list_programs(caller.as_ref(), &options).await {
        Ok(programs) => (StatusCode::OK, axum::Json(programs)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn enroll_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    moment: Option<axum::Json<MutationMoment>>,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = match require_caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    let now = moment.map(|axum::Json(m)| m).unwrap_or_default().resolve();
    match service.enroll(&caller, &CourseCode(code), now) {
        Ok(registration) => (StatusCode::CREATED, axum::Json(registration)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn request_invitation_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    moment: Option<axum::Json<MutationMoment>>,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = match require_caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    let now = moment.map(|axum::Json(m)| m).unwrap_or_default().resolve();
    match service.request_invitation(&caller, &CourseCode(code), now) {
        Ok(registration) => (StatusCode::ACCEPTED, axum::Json(registration)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn pending_invitations_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = match require_caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match service.pending_invitations(&caller, &CourseCode(code)) {
        Ok(registrations) => (StatusCode::OK, axum::Json(registrations)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn confirm_invitation_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ConfirmInvitationRequest>,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = match require_caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match service.confirm_invitation(&caller, &CourseCode(code), &request.user) {
        Ok(registration) => (StatusCode::OK, axum::Json(registration)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_group_handler<S, R>(
    State(service): State<Arc<CourseCatalogService<S, R>>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<UpdateGroupRequest>,
) -> Response
where
    S: CatalogStore + 'static,
    R: RegistrationStore + 'static,
{
    let caller = match require_caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    let now = request.now.unwrap_or_else(Utc::now);
    match service.update_group(&caller, &CourseCode(code), request.group, now) {
        Ok(registration) => (StatusCode::OK, axum::Json(registration)).into_response(),
        Err(error) => error_response(error),
    }
}
