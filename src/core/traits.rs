use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, EntityTrait, FromQueryResult, IdenStatic,
    IntoActiveModel, ModelTrait,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::filtering::{Direction, ListDefaults, OrderSpec};

/// How an association field relates to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// The field holds the key of exactly one target entity
    ToOne,
    /// The field is a collection on the target side
    ToMany,
}

/// An association field declared by a resource.
///
/// `field` is the column holding the reference, `target` the singular
/// resource name registered with an [`EntityResolver`](crate::EntityResolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    pub field: &'static str,
    pub kind: RelationKind,
    pub target: &'static str,
}

impl Association {
    #[must_use]
    pub const fn to_one(field: &'static str, target: &'static str) -> Self {
        Self {
            field,
            kind: RelationKind::ToOne,
            target,
        }
    }

    #[must_use]
    pub const fn to_many(field: &'static str, target: &'static str) -> Self {
        Self {
            field,
            kind: RelationKind::ToMany,
            target,
        }
    }
}

/// A Sea-ORM entity exposed as a REST resource.
///
/// ```rust,ignore
/// impl Resource for task::Entity {
///     type EntityType = task::Entity;
///     type ModelType = task::Model;
///     type ActiveModelType = task::ActiveModel;
///
///     const ID_COLUMN: task::Column = task::Column::Id;
///     const RESOURCE_NAME_SINGULAR: &'static str = "task";
///     const RESOURCE_NAME_PLURAL: &'static str = "tasks";
///
///     fn associations() -> Vec<Association> {
///         vec![Association::to_one("project_id", "project")]
///     }
/// }
/// ```
pub trait Resource: Sized + Send + Sync + 'static {
    type EntityType: EntityTrait<Model = Self::ModelType, ActiveModel = Self::ActiveModelType>;
    type ModelType: ModelTrait<Entity = Self::EntityType>
        + FromQueryResult
        + IntoActiveModel<Self::ActiveModelType>
        + Serialize
        + DeserializeOwned
        + Clone
        + Send
        + Sync;
    type ActiveModelType: ActiveModelTrait<Entity = Self::EntityType>
        + ActiveModelBehavior
        + Send
        + Sync;

    /// Primary key column, holding a UUID
    const ID_COLUMN: <Self::EntityType as EntityTrait>::Column;
    const RESOURCE_NAME_SINGULAR: &'static str;
    const RESOURCE_NAME_PLURAL: &'static str;
    const RESOURCE_DESCRIPTION: &'static str = "";

    /// Association fields. To-one references are resolved before hydration.
    #[must_use]
    fn associations() -> Vec<Association> {
        vec![]
    }

    /// Deletion guard. A `false` rejects the delete with 403 and nothing is removed.
    #[must_use]
    fn can_delete(_model: &Self::ModelType) -> bool {
        true
    }

    /// Page sizes and the fallback ordering, ascending by the id column.
    #[must_use]
    fn list_defaults() -> ListDefaults {
        ListDefaults {
            default_order: vec![OrderSpec::new(Self::ID_COLUMN.as_str(), Direction::Asc)],
            ..ListDefaults::default()
        }
    }
}
