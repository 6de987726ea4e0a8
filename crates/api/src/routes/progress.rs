//! Lecture progress endpoints for enrolled users.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{CourseId, LectureId};
use ledger::EnrollmentStore;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::checkout::{AppState, parse_course_id};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub success: bool,
    pub course_id: CourseId,
    pub completed_lectures: Vec<LectureId>,
}

/// GET /progress/{courseId} — the caller's progress on an owned course.
#[tracing::instrument(skip(state))]
pub async fn get<S: EnrollmentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(course_id): Path<String>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProgressResponse>, ApiError> {
    let course_id = parse_course_id(&course_id)?;

    let progress = state.orchestrator.course_progress(user_id, course_id).await?;

    Ok(Json(ProgressResponse {
        success: true,
        course_id: progress.course_id,
        completed_lectures: progress.completed_lectures,
    }))
}

/// POST /progress/{courseId}/lectures/{lectureId} — mark a lecture
/// complete, idempotently.
#[tracing::instrument(skip(state))]
pub async fn complete_lecture<S: EnrollmentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((course_id, lecture_id)): Path<(String, String)>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProgressResponse>, ApiError> {
    let course_id = parse_course_id(&course_id)?;
    let lecture_id = parse_lecture_id(&lecture_id)?;

    let progress = state
        .orchestrator
        .complete_lecture(user_id, course_id, lecture_id)
        .await?;

    Ok(Json(ProgressResponse {
        success: true,
        course_id: progress.course_id,
        completed_lectures: progress.completed_lectures,
    }))
}

fn parse_lecture_id(id: &str) -> Result<LectureId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid lecture ID: {e}")))?;
    Ok(LectureId::from_uuid(uuid))
}
