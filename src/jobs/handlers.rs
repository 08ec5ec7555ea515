use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    auth::extractors::{CurrentUser, VerifiedUser},
    error::AppError,
    extract::{AppJson, AppQuery},
    posts::Pagination,
    state::AppState,
};

use super::repo_types::{Job, NewJob};

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    pub description: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/jobs", get(list_jobs).post(create_job))
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[instrument(skip_all)]
pub async fn list_jobs(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    AppQuery(p): AppQuery<Pagination>,
) -> Result<Json<Vec<Job>>, AppError> {
    let (limit, offset) = p.clamped();
    Ok(Json(state.jobs.list(limit, offset).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_job(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    AppJson(body): AppJson<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let job = NewJob {
        posted_by: user.id,
        title: required("Title", &body.title)?,
        company: required("Company", &body.company)?,
        location: body
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
        description: required("Description", &body.description)?,
    };
    let job = state.jobs.insert(job).await?;
    info!(job_id = %job.id, "job posted");
    Ok((StatusCode::CREATED, Json(job)))
}
