//! Axum handlers shared by every resource.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRef, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use shelf_authz::Action;
use shelf_db::{Changes, ColumnKind, Record, Source, SqlValue, TableSchema};
use shelf_http::{authorize, Actor, AppError, FieldErrors};
use shelf_kernel::AppContext;

use super::validate::{self, Mode};
use super::{params, Resource};
use crate::utils;

/// Router state: the shared application context plus the resource served.
pub struct ResourceState<R> {
    pub ctx: AppContext,
    pub resource: Arc<R>,
}

impl<R> Clone for ResourceState<R> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            resource: self.resource.clone(),
        }
    }
}

impl<R> FromRef<ResourceState<R>> for AppContext {
    fn from_ref(state: &ResourceState<R>) -> Self {
        state.ctx.clone()
    }
}

pub fn router<R: Resource>(resource: Arc<R>, ctx: &AppContext) -> Router {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route(
            "/{id}",
            get(retrieve::<R>)
                .put(replace::<R>)
                .patch(partial_update::<R>)
                .delete(destroy::<R>),
        )
        .with_state(ResourceState {
            ctx: ctx.clone(),
            resource,
        })
}

async fn list<R: Resource>(
    State(state): State<ResourceState<R>>,
    actor: Actor,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Record>>, AppError> {
    let schema = state.resource.schema();
    authorize(schema.name, &state.resource.policy(), Action::List, &actor)?;

    let query = params::list_query(schema, &pairs, state.ctx.settings.api.max_limit)?;
    let rows = state.ctx.db.list(schema, &query).await?;
    Ok(Json(rows))
}

async fn retrieve<R: Resource>(
    State(state): State<ResourceState<R>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<Record>, AppError> {
    let schema = state.resource.schema();
    authorize(schema.name, &state.resource.policy(), Action::Retrieve, &actor)?;

    let id = parse_id(schema, &id)?;
    state
        .ctx
        .db
        .fetch(schema, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(schema))
}

async fn create<R: Resource>(
    State(state): State<ResourceState<R>>,
    actor: Actor,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), AppError> {
    let schema = state.resource.schema();
    authorize(schema.name, &state.resource.policy(), Action::Create, &actor)?;

    let body = json_object(body)?;
    let mut changes = validated(&state, &body, Mode::Create, None).await?;
    stamp(schema, &mut changes, &actor, Action::Create)?;

    let record = state.ctx.db.insert(schema, &changes).await?;
    tracing::info!(
        resource = schema.name,
        id = ?record.get("id"),
        user = actor.username().unwrap_or_default(),
        "record created"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

async fn replace<R: Resource>(
    state: State<ResourceState<R>>,
    actor: Actor,
    id: Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record>, AppError> {
    update(state, actor, id, body, Mode::Replace).await
}

async fn partial_update<R: Resource>(
    state: State<ResourceState<R>>,
    actor: Actor,
    id: Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record>, AppError> {
    update(state, actor, id, body, Mode::Partial).await
}

async fn update<R: Resource>(
    State(state): State<ResourceState<R>>,
    actor: Actor,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
    mode: Mode,
) -> Result<Json<Record>, AppError> {
    let schema = state.resource.schema();
    authorize(schema.name, &state.resource.policy(), Action::Update, &actor)?;

    let id = parse_id(schema, &id)?;
    if !state
        .ctx
        .db
        .exists(schema.name, "id", &SqlValue::Integer(id), None)
        .await?
    {
        return Err(not_found(schema));
    }

    let body = json_object(body)?;
    let mut changes = validated(&state, &body, mode, Some(id)).await?;
    stamp(schema, &mut changes, &actor, Action::Update)?;

    let record = state
        .ctx
        .db
        .update(schema, id, &changes)
        .await?
        .ok_or_else(|| not_found(schema))?;
    tracing::info!(
        resource = schema.name,
        id,
        fields = changes.len(),
        user = actor.username().unwrap_or_default(),
        "record updated"
    );
    Ok(Json(record))
}

async fn destroy<R: Resource>(
    State(state): State<ResourceState<R>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let schema = state.resource.schema();
    authorize(schema.name, &state.resource.policy(), Action::Delete, &actor)?;

    let id = parse_id(schema, &id)?;
    if state.ctx.db.delete(schema, id).await? {
        tracing::info!(
            resource = schema.name,
            id,
            user = actor.username().unwrap_or_default(),
            "record deleted"
        );
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(schema))
    }
}

/// Column checks, entity rules, then the checks that need the store.
/// Nothing is written unless every field passes.
async fn validated<R: Resource>(
    state: &ResourceState<R>,
    body: &Map<String, Value>,
    mode: Mode,
    id: Option<i64>,
) -> Result<Changes, AppError> {
    let schema = state.resource.schema();
    let db = &state.ctx.db;
    let today = utils::today();

    let mut errors = FieldErrors::new();
    let changes = validate::validate_body(schema, body, mode, today, &mut errors);
    state.resource.check(&changes, today, &mut errors);

    for column in schema.writable_columns() {
        if errors.has(column.name) {
            continue;
        }
        let Some(value) = changes.get(column.name).filter(|v| !v.is_null()) else {
            continue;
        };

        if let ColumnKind::Reference { table } = column.kind {
            if !db.exists(table, "id", value, None).await? {
                let pk = value.as_integer().unwrap_or_default();
                errors.push(
                    column.name,
                    format!("Invalid pk \"{pk}\" - object does not exist."),
                );
                continue;
            }
        }
        if column.unique && db.exists(schema.name, column.name, value, id).await? {
            errors.push(
                column.name,
                format!("{} with this {} already exists.", schema.label, column.name),
            );
        }
    }

    errors.into_result()?;
    Ok(changes)
}

/// Fill server-owned columns: timestamps and the acting username.
fn stamp(
    schema: &TableSchema,
    changes: &mut Changes,
    actor: &Actor,
    action: Action,
) -> Result<(), AppError> {
    let now = utils::timestamp();
    for column in schema.columns {
        match column.source {
            Source::CreatedAt if action == Action::Create => changes.set(column.name, now.clone()),
            Source::UpdatedAt => changes.set(column.name, now.clone()),
            Source::Actor if action == Action::Create => {
                let username = actor.username().ok_or_else(|| {
                    AppError::unauthorized("Authentication credentials were not provided.")
                })?;
                changes.set(column.name, username.to_string());
            }
            _ => {}
        }
    }
    Ok(())
}

fn json_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(other)) => Err(AppError::bad_request(format!(
            "Invalid data. Expected a dictionary, but got {}.",
            validate::json_type_name(&other)
        ))),
        Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
    }
}

/// Ids that are not integers cannot name a row.
fn parse_id(schema: &TableSchema, raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| not_found(schema))
}

fn not_found(schema: &TableSchema) -> AppError {
    AppError::not_found(format!(
        "No {} matches the given query.",
        schema.component_name()
    ))
}
