use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::checklist::{ChecklistError, ChecklistUpdate};
use super::domain::{CaseDraft, CaseFieldsPatch, CaseId, TurnoverCase, TurnoverStage};
use super::query::{CaseFilter, ResponsibleFilter};
use super::repository::{CaseRepository, RepositoryError};
use super::service::{ServiceError, TurnoverService};
use super::views::{CaseDetailView, CaseSummaryView};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub responsible: ResponsibleFilter,
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateCaseRequest {
    #[serde(flatten)]
    pub draft: CaseDraft,
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
pub struct StageRequest {
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistRequest {
    pub update: ChecklistUpdate,
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub author: String,
    pub text: String,
}

/// Router builder exposing the case endpoints.
pub fn case_router<R>(service: Arc<TurnoverService<R>>) -> Router
where
    R: CaseRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/cases",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/api/v1/cases/:case_id",
            get(detail_handler::<R>)
                .patch(patch_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .route("/api/v1/cases/:case_id/stage", post(stage_handler::<R>))
        .route(
            "/api/v1/cases/:case_id/checklist/:index",
            put(checklist_handler::<R>),
        )
        .route(
            "/api/v1/cases/:case_id/comments",
            post(comment_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Query(params): Query<ListParams>,
) -> Response
where
    R: CaseRepository + 'static,
{
    let now = Utc::now();
    let filter = CaseFilter {
        query: params.query,
        responsible: params.responsible,
    };

    match service.list(&filter, params.include_archived, now) {
        Ok(cases) => {
            let views: Vec<CaseSummaryView> = cases
                .iter()
                .map(|case| CaseSummaryView::of(case, now))
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    axum::Json(request): axum::Json<CreateCaseRequest>,
) -> Response
where
    R: CaseRepository + 'static,
{
    let now = Utc::now();
    match service.create(request.draft, &request.created_by, now) {
        Ok(case) => (
            StatusCode::CREATED,
            axum::Json(CaseDetailView::of(case, now)),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn detail_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Path(case_id): Path<String>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match service.get(&CaseId(case_id)) {
        Ok(case) => detail_response(StatusCode::OK, case),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn patch_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Path(case_id): Path<String>,
    body: Result<axum::Json<CaseFieldsPatch>, JsonRejection>,
) -> Response
where
    R: CaseRepository + 'static,
{
    // Unknown keys (status, checklist, comments) surface here as a 422 data error.
    let fields = match body {
        Ok(axum::Json(fields)) => fields,
        Err(rejection) => {
            let payload = json!({ "error": rejection.body_text() });
            return (rejection.status(), axum::Json(payload)).into_response();
        }
    };

    match service.update_fields(&CaseId(case_id), fields, Utc::now()) {
        Ok(case) => detail_response(StatusCode::OK, case),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Path(case_id): Path<String>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match service.delete(&CaseId(case_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stage_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Path(case_id): Path<String>,
    axum::Json(request): axum::Json<StageRequest>,
) -> Response
where
    R: CaseRepository + 'static,
{
    let Some(target) = TurnoverStage::parse(&request.target) else {
        let payload = json!({
            "error": format!("unknown stage '{}'", request.target),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    };

    match service.change_stage(&CaseId(case_id), target, Utc::now()) {
        Ok(change) => detail_response(StatusCode::OK, change.case),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn checklist_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Path((case_id, index)): Path<(String, usize)>,
    axum::Json(request): axum::Json<ChecklistRequest>,
) -> Response
where
    R: CaseRepository + 'static,
{
    let now = Utc::now();
    match service.update_checklist_entry(
        &CaseId(case_id),
        index,
        request.update,
        &request.actor,
        now,
    ) {
        Ok(outcome) => {
            let payload = json!({
                "case": CaseDetailView::of(outcome.case, now),
                "suggested_next_stage": outcome.suggested_next_stage,
                "auto_advanced_to": outcome.auto_advanced_to,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn comment_handler<R>(
    State(service): State<Arc<TurnoverService<R>>>,
    Path(case_id): Path<String>,
    axum::Json(request): axum::Json<CommentRequest>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match service.add_comment(&CaseId(case_id), &request.author, &request.text, Utc::now()) {
        Ok(case) => detail_response(StatusCode::CREATED, case),
        Err(error) => error_response(error),
    }
}

fn detail_response(status: StatusCode, case: TurnoverCase) -> Response {
    (status, axum::Json(CaseDetailView::of(case, Utc::now()))).into_response()
}

fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::TransitionRefused { .. }
        | ServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ServiceError::EmptyComment
        | ServiceError::Checklist(ChecklistError::KindMismatch { .. })
        | ServiceError::Checklist(ChecklistError::UnknownGroupField(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ServiceError::Checklist(ChecklistError::UnknownEntry(_))
        | ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
