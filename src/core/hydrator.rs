use std::marker::PhantomData;

use serde_json::{Map, Value};

use super::Resource;
use crate::ApiError;

/// Converts between attribute maps and entity models.
///
/// The listener only ever talks to entities through this seam, so a resource
/// can swap in its own field mapping (renames, computed fields) without
/// touching any verb.
pub trait Hydrator<R: Resource>: Send + Sync {
    /// Build a model from a complete attribute map.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnprocessableEntity`] when the data does not describe a valid entity.
    fn hydrate(&self, data: Map<String, Value>) -> Result<R::ModelType, ApiError>;

    /// Flatten a model into its attribute map.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] if the model cannot be represented as a map.
    fn extract(&self, model: &R::ModelType) -> Result<Map<String, Value>, ApiError>;
}

/// Serde-backed hydrator: attribute names are the model's serialized field names.
pub struct JsonHydrator<R>(PhantomData<fn() -> R>);

impl<R> JsonHydrator<R> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for JsonHydrator<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Hydrator<R> for JsonHydrator<R> {
    fn hydrate(&self, data: Map<String, Value>) -> Result<R::ModelType, ApiError> {
        serde_json::from_value(Value::Object(data)).map_err(|err| {
            ApiError::unprocessable(format!(
                "Invalid {} payload: {err}",
                R::RESOURCE_NAME_SINGULAR
            ))
        })
    }

    fn extract(&self, model: &R::ModelType) -> Result<Map<String, Value>, ApiError> {
        match serde_json::to_value(model) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ApiError::internal(
                "Failed to read entity",
                Some(format!(
                    "{} serialized to a non-object: {other}",
                    R::RESOURCE_NAME_SINGULAR
                )),
            )),
            Err(err) => Err(ApiError::internal(
                "Failed to read entity",
                Some(err.to_string()),
            )),
        }
    }
}
