use crudlistener::{Association, Resource};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub cycle_number: i64,
    #[serde(default)]
    pub completed: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub project_id: Option<Uuid>,
    pub due_on: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub struct Task;

impl Resource for Task {
    type EntityType = Entity;
    type ModelType = Model;
    type ActiveModelType = ActiveModel;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "task";
    const RESOURCE_NAME_PLURAL: &'static str = "tasks";
    const RESOURCE_DESCRIPTION: &'static str = "Tasks sampled by cycle number";

    fn associations() -> Vec<Association> {
        vec![Association::to_one("project_id", "project")]
    }
}
