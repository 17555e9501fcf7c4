use axum::{
    extract::{Form, Path, Query, State},
    response::Html,
};
use thiserror::Error;

use crate::deadline::parse_deadline;
use crate::errors::{AppError, AppResult};
use crate::middleware::{CurrentUser, RequireLogin};
use crate::models::task::{self, build_forest};
use crate::models::{NewTask, Task, TaskForm, TaskStatusForm, User};
use crate::notice::{Notice, NoticeParams, Outcome};
use crate::services::StoreError;
use crate::views::PageContext;
use crate::AppState;

const PLANNING: &str = "/tasks/";

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Le titre et le contenu sont obligatoires.")]
    MissingField,

    #[error("Format de date limite invalide.")]
    InvalidDeadline,

    #[error("Tâche parente introuvable.")]
    ParentNotFound(task::Id),

    #[error("Tâche introuvable.")]
    NotFound(task::Id),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TaskError> for AppError {
    fn from(error: TaskError) -> Self {
        match error {
            TaskError::Store(e) => AppError::Store(e),
            e @ TaskError::NotFound(_) => AppError::not_found(PLANNING, e),
            e => AppError::validation(PLANNING, e),
        }
    }
}

pub async fn serve_planning(
    State(state): State<AppState>,
    RequireLogin(user): RequireLogin,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let tasks = state.store.list_tasks().await?;
    let forest = build_forest(tasks);

    let current = CurrentUser(Some(user));
    let ctx = PageContext {
        current: &current,
        notice: notice.into_notice(),
    };
    state.views.planning(&ctx, &forest).await
}

/// Validates the form and stores the task under `parent`, which must exist.
async fn add_task(
    state: &AppState,
    author: &User,
    parent: Option<task::Id>,
    form: TaskForm,
) -> Result<Task, TaskError> {
    let title = form.title.trim();
    let content = form.content.trim();
    if title.is_empty() || content.is_empty() {
        return Err(TaskError::MissingField);
    }

    let deadline = parse_deadline(&form.deadline).map_err(|_| TaskError::InvalidDeadline)?;

    if let Some(parent) = parent {
        if state.store.get_task(parent).await?.is_none() {
            return Err(TaskError::ParentNotFound(parent));
        }
    }

    let task = state
        .store
        .create_task(NewTask {
            title: title.to_string(),
            content: content.to_string(),
            deadline,
            author: author.id,
            parent,
        })
        .await?;
    Ok(task)
}

pub async fn create_root_task(
    State(state): State<AppState>,
    RequireLogin(user): RequireLogin,
    Form(form): Form<TaskForm>,
) -> AppResult<Outcome> {
    let task = add_task(&state, &user, None, form).await?;
    tracing::info!("User {} created task {}", user.username, task.id);

    Ok(Notice::success("Tâche ajoutée.").redirect(PLANNING))
}

pub async fn create_sub_task(
    State(state): State<AppState>,
    RequireLogin(user): RequireLogin,
    Path(parent_id): Path<i64>,
    Form(form): Form<TaskForm>,
) -> AppResult<Outcome> {
    let task = add_task(&state, &user, Some(task::Id(parent_id)), form).await?;
    tracing::info!("User {} created task {} under {}", user.username, task.id, parent_id);

    Ok(Notice::success("Sous-tâche ajoutée.").redirect(PLANNING))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    RequireLogin(user): RequireLogin,
    Path(id): Path<i64>,
    Form(form): Form<TaskStatusForm>,
) -> AppResult<Outcome> {
    let id = task::Id(id);
    let mut task = state
        .store
        .get_task(id)
        .await?
        .ok_or(TaskError::NotFound(id))?;

    task.done = form.is_done();
    state.store.save_task(&task).await?;
    tracing::info!("User {} marked task {} done={}", user.username, task.id, task.done);

    Ok(Notice::success("Statut de la tâche mis à jour.").redirect(PLANNING))
}
