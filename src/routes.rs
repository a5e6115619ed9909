use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, RawQuery, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{HeaderMap, StatusCode},
    routing::get,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    ApiError, Collection, Resource, ResourceListener,
    filtering::{calculate_content_range, parse_query_string},
};

/// Routes for one resource, to be nested under its collection path.
///
/// | path    | GET       | POST   | PUT           | PATCH | DELETE         |
/// |---------|-----------|--------|---------------|-------|----------------|
/// | `/`     | fetch_all | create | 405           |       | 405            |
/// | `/{id}` | fetch     |        | update        | patch | delete         |
///
/// An `{id}` that is not a UUID names no resource and answers 404. A body that
/// is not JSON answers 400, and JSON that is not an object answers 422. Both
/// carry the same problem body as every other error.
///
/// ```rust,ignore
/// let app = Router::new().nest("/api/v1/tasks", router(ResourceListener::<Task>::new(db)));
/// ```
pub fn router<R: Resource>(listener: ResourceListener<R>) -> Router {
    Router::new()
        .route(
            "/",
            get(fetch_all::<R>)
                .post(create::<R>)
                .put(replace_list::<R>)
                .delete(delete_list::<R>),
        )
        .route(
            "/{id}",
            get(fetch::<R>)
                .put(update::<R>)
                .patch(patch::<R>)
                .delete(delete::<R>),
        )
        .with_state(listener)
}

pub async fn fetch_all<R: Resource>(
    State(listener): State<ResourceListener<R>>,
    RawQuery(query): RawQuery,
) -> Result<(HeaderMap, Json<Collection<R::ModelType>>), ApiError> {
    let params = parse_query_string(query.as_deref().unwrap_or_default());
    let collection = listener.fetch_all(params).await?;
    let headers = calculate_content_range(&collection.meta, R::RESOURCE_NAME_PLURAL);
    Ok((headers, Json(collection)))
}

pub async fn fetch<R: Resource>(
    State(listener): State<ResourceListener<R>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<R::ModelType>, ApiError> {
    let id = resource_id::<R>(path)?;
    Ok(Json(listener.fetch(id).await?))
}

pub async fn create<R: Resource>(
    State(listener): State<ResourceListener<R>>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<(StatusCode, Json<R::ModelType>), ApiError> {
    let created = listener.create(json_body(body)?).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update<R: Resource>(
    State(listener): State<ResourceListener<R>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<R::ModelType>, ApiError> {
    let id = resource_id::<R>(path)?;
    Ok(Json(listener.update(id, json_body(body)?).await?))
}

pub async fn patch<R: Resource>(
    State(listener): State<ResourceListener<R>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<R::ModelType>, ApiError> {
    let id = resource_id::<R>(path)?;
    Ok(Json(listener.patch(id, json_body(body)?).await?))
}

pub async fn delete<R: Resource>(
    State(listener): State<ResourceListener<R>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = resource_id::<R>(path)?;
    listener.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Collection verbs take any body, or none.
pub async fn delete_list<R: Resource>(
    State(listener): State<ResourceListener<R>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    listener.delete_list(&lenient_json(&body))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn replace_list<R: Resource>(
    State(listener): State<ResourceListener<R>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    listener.replace_list(&lenient_json(&body))?;
    Ok(StatusCode::NO_CONTENT)
}

fn resource_id<R: Resource>(
    path: Result<Path<String>, PathRejection>,
) -> Result<Uuid, ApiError> {
    let Path(raw) =
        path.map_err(|rejection| ApiError::invalid_parameter(rejection.body_text()))?;
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::not_found(R::RESOURCE_NAME_SINGULAR, Some(raw)))
}

fn json_body(
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Map<String, Value>, ApiError> {
    match body {
        Ok(Json(data)) => Ok(data),
        Err(JsonRejection::JsonDataError(rejection)) => {
            Err(ApiError::unprocessable(rejection.body_text()))
        }
        Err(rejection) => Err(ApiError::invalid_parameter(rejection.body_text())),
    }
}

fn lenient_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}
