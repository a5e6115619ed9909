use crudlistener::{Association, Resource};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub struct Project;

impl Resource for Project {
    type EntityType = Entity;
    type ModelType = Model;
    type ActiveModelType = ActiveModel;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "project";
    const RESOURCE_NAME_PLURAL: &'static str = "projects";

    fn associations() -> Vec<Association> {
        vec![Association::to_many("tasks", "task")]
    }

    // Locked projects are archived and must outlive their tasks
    fn can_delete(model: &Model) -> bool {
        !model.locked
    }
}
