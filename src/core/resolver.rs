use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter};
use serde_json::Value;
use uuid::Uuid;

use super::Resource;
use crate::ApiError;

/// Resolves the value of a to-one association field to the entity it names.
///
/// Called inside the mutating verb's transaction, so a reference is checked
/// against the same snapshot the write commits to.
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    /// Returns the normalized reference when `target` has an entity with `id`,
    /// `None` when it does not.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidParameter`] for an id that cannot name any
    /// entity, and a 500 error when `target` is not known to this resolver.
    async fn resolve_reference(
        &self,
        txn: &DatabaseTransaction,
        target: &str,
        id: &Value,
    ) -> Result<Option<Value>, ApiError>;
}

#[async_trait]
trait Lookup: Send + Sync {
    async fn exists(&self, txn: &DatabaseTransaction, id: Uuid) -> Result<bool, ApiError>;
}

struct EntityLookup<R>(PhantomData<fn() -> R>);

#[async_trait]
impl<R: Resource> Lookup for EntityLookup<R> {
    async fn exists(&self, txn: &DatabaseTransaction, id: Uuid) -> Result<bool, ApiError> {
        let found = R::EntityType::find()
            .filter(R::ID_COLUMN.eq(id))
            .one(txn)
            .await?;
        Ok(found.is_some())
    }
}

/// Resolver backed by the registered resources' own tables.
///
/// ```rust,ignore
/// let resolver = EntityResolver::new().register::<Project>();
/// let tasks = ResourceListener::<Task>::new(db).with_resolver(Arc::new(resolver));
/// ```
#[derive(Clone, Default)]
pub struct EntityResolver {
    lookups: HashMap<&'static str, Arc<dyn Lookup>>,
}

impl EntityResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `R` resolvable under its singular resource name.
    #[must_use]
    pub fn register<R: Resource>(mut self) -> Self {
        self.lookups.insert(
            R::RESOURCE_NAME_SINGULAR,
            Arc::new(EntityLookup::<R>(PhantomData)),
        );
        self
    }

    #[must_use]
    pub fn knows(&self, target: &str) -> bool {
        self.lookups.contains_key(target)
    }
}

#[async_trait]
impl ReferenceResolver for EntityResolver {
    async fn resolve_reference(
        &self,
        txn: &DatabaseTransaction,
        target: &str,
        id: &Value,
    ) -> Result<Option<Value>, ApiError> {
        let lookup = self.lookups.get(target).ok_or_else(|| {
            ApiError::internal(
                "Reference could not be resolved",
                Some(format!("no resolver registered for `{target}`")),
            )
        })?;
        let uuid = id
            .as_str()
            .and_then(|text| Uuid::parse_str(text.trim()).ok())
            .ok_or_else(|| ApiError::invalid_parameter(format!("Invalid {target} id {id}")))?;

        if lookup.exists(txn, uuid).await? {
            Ok(Some(Value::String(uuid.to_string())))
        } else {
            Ok(None)
        }
    }
}
