use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IdenStatic, IntoActiveModel, PaginatorTrait, QueryFilter, TransactionTrait,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{EntityResolver, Hydrator, JsonHydrator, ReferenceResolver, RelationKind, Resource};
use crate::{
    ApiError,
    collection::Collection,
    filtering::{PageMeta, QueryRequest, build_query},
};

/// Translates REST verbs into persistence operations on one resource.
///
/// Reads run on the connection. Each mutating verb runs in its own
/// transaction and commits once, after the write succeeded; returning early
/// with an error drops the transaction, which rolls it back.
pub struct ResourceListener<R: Resource> {
    db: DatabaseConnection,
    hydrator: Arc<dyn Hydrator<R>>,
    resolver: Arc<dyn ReferenceResolver>,
}

impl<R: Resource> Clone for ResourceListener<R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            hydrator: Arc::clone(&self.hydrator),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<R: Resource> ResourceListener<R> {
    /// Listener with the serde hydrator and an empty [`EntityResolver`].
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            hydrator: Arc::new(JsonHydrator::<R>::new()),
            resolver: Arc::new(EntityResolver::new()),
        }
    }

    #[must_use]
    pub fn with_hydrator(mut self, hydrator: Arc<dyn Hydrator<R>>) -> Self {
        self.hydrator = hydrator;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn ReferenceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Create a resource from `data`. A missing or null id is generated.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for an unresolvable reference, `UnprocessableEntity`
    /// when the data does not hydrate, `Conflict` on a duplicate key.
    pub async fn create(&self, data: Map<String, Value>) -> Result<R::ModelType, ApiError> {
        let txn = self.db.begin().await?;
        let mut data = self.populate_references(&txn, data).await?;

        let id_field = id_field::<R>();
        if data.get(&id_field).is_none_or(Value::is_null) {
            data.insert(id_field, Value::String(Uuid::new_v4().to_string()));
        }

        let model = self.hydrator.hydrate(data)?;
        let created = model.into_active_model().reset_all().insert(&txn).await?;
        txn.commit().await?;

        tracing::debug!(resource = R::RESOURCE_NAME_SINGULAR, "Created resource");
        Ok(created)
    }

    /// Fetch a resource by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if no resource has this id.
    pub async fn fetch(&self, id: Uuid) -> Result<R::ModelType, ApiError> {
        tracing::debug!(resource = R::RESOURCE_NAME_SINGULAR, %id, "Fetching resource");
        find::<R, _>(&self.db, id).await
    }

    /// Fetch one page of the collection described by `params`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for malformed pagination, ordering or filters.
    pub async fn fetch_all(
        &self,
        params: Map<String, Value>,
    ) -> Result<Collection<R::ModelType>, ApiError> {
        let request = QueryRequest::from_params(&params, &R::list_defaults())?;
        let built = build_query::<R>(&request)?;
        tracing::debug!(
            resource = R::RESOURCE_NAME_PLURAL,
            predicates = built.predicate_count,
            "Fetching collection"
        );

        let items = built.select.all(&self.db).await?;
        let total = R::EntityType::find()
            .filter(built.condition)
            .count(&self.db)
            .await?;
        let collection_total = R::EntityType::find().count(&self.db).await?;

        let meta = PageMeta::new(built.window, items.len() as u64, total, collection_total);
        Ok(Collection::new(items, meta, params))
    }

    /// Merge `data` onto the persisted resource. Fields absent from `data` keep
    /// their current values.
    ///
    /// # Errors
    ///
    /// `NotFound` if no resource has this id, otherwise as [`Self::update`].
    pub async fn patch(
        &self,
        id: Uuid,
        data: Map<String, Value>,
    ) -> Result<R::ModelType, ApiError> {
        let txn = self.db.begin().await?;
        let existing = find::<R, _>(&txn, id).await?;
        let data = self.populate_references(&txn, data).await?;

        let mut merged = self.hydrator.extract(&existing)?;
        merged.extend(data);
        let updated = self.save(&txn, id, merged).await?;
        txn.commit().await?;

        tracing::debug!(resource = R::RESOURCE_NAME_SINGULAR, %id, "Patched resource");
        Ok(updated)
    }

    /// Replace the persisted resource with `data`. Optional fields absent from
    /// `data` are cleared; required ones must be present.
    ///
    /// # Errors
    ///
    /// `NotFound` if no resource has this id, `InvalidParameter` for an
    /// unresolvable reference, `UnprocessableEntity` when the data does not hydrate.
    pub async fn update(
        &self,
        id: Uuid,
        data: Map<String, Value>,
    ) -> Result<R::ModelType, ApiError> {
        let txn = self.db.begin().await?;
        find::<R, _>(&txn, id).await?;
        let data = self.populate_references(&txn, data).await?;

        let updated = self.save(&txn, id, data).await?;
        txn.commit().await?;

        tracing::debug!(resource = R::RESOURCE_NAME_SINGULAR, %id, "Updated resource");
        Ok(updated)
    }

    /// Delete a resource, subject to [`Resource::can_delete`].
    ///
    /// # Errors
    ///
    /// `NotFound` if no resource has this id, `Forbidden` when the resource
    /// refuses deletion. Nothing is removed in either case.
    pub async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let txn = self.db.begin().await?;
        let existing = find::<R, _>(&txn, id).await?;

        if !R::can_delete(&existing) {
            tracing::warn!(resource = R::RESOURCE_NAME_SINGULAR, %id, "Delete rejected");
            return Err(ApiError::forbidden(format!(
                "Cannot delete {} with id {id}",
                R::RESOURCE_NAME_SINGULAR
            )));
        }

        R::EntityType::delete_many()
            .filter(R::ID_COLUMN.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::debug!(resource = R::RESOURCE_NAME_SINGULAR, %id, "Deleted resource");
        Ok(true)
    }

    /// Collection-level delete is not defined.
    ///
    /// # Errors
    ///
    /// Always `MethodNotSupported`.
    pub fn delete_list(&self, _data: &Value) -> Result<(), ApiError> {
        Err(ApiError::method_not_supported(
            "The DELETE method has not been defined for collections",
        ))
    }

    /// Collection-level replace is not defined.
    ///
    /// # Errors
    ///
    /// Always `MethodNotSupported`.
    pub fn replace_list(&self, _data: &Value) -> Result<(), ApiError> {
        Err(ApiError::method_not_supported(
            "The PUT method has not been defined for collections",
        ))
    }

    /// Hydrate `data` with the id pinned and write every column.
    async fn save(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
        mut data: Map<String, Value>,
    ) -> Result<R::ModelType, ApiError> {
        data.insert(id_field::<R>(), Value::String(id.to_string()));
        let model = self.hydrator.hydrate(data)?;
        Ok(model.into_active_model().reset_all().update(txn).await?)
    }

    /// Replace every to-one reference in `data` with the resolved value.
    /// Null references pass through; other relation kinds are left untouched.
    async fn populate_references(
        &self,
        txn: &DatabaseTransaction,
        mut data: Map<String, Value>,
    ) -> Result<Map<String, Value>, ApiError> {
        for association in R::associations() {
            if association.kind != RelationKind::ToOne {
                continue;
            }
            let Some(reference) = data.get(association.field).filter(|value| !value.is_null())
            else {
                continue;
            };
            let resolved = self
                .resolver
                .resolve_reference(txn, association.target, reference)
                .await?
                .ok_or_else(|| {
                    ApiError::invalid_parameter(format!(
                        "{} {reference} referenced by `{}` was not found",
                        association.target, association.field
                    ))
                })?;
            data.insert(association.field.to_string(), resolved);
        }
        Ok(data)
    }
}

fn id_field<R: Resource>() -> String {
    R::ID_COLUMN.as_str().to_owned()
}

async fn find<R: Resource, C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<R::ModelType, ApiError> {
    R::EntityType::find()
        .filter(R::ID_COLUMN.eq(id))
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(R::RESOURCE_NAME_SINGULAR, Some(id.to_string())))
}
