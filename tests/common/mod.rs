#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use crudlistener::{EntityResolver, ResourceListener, router};
use sea_orm::{Database, DatabaseConnection, DbErr, Schema};
use sea_orm_migration::prelude::*;
use serde_json::{Map, Value};

pub mod project_entity;
pub mod task_entity;

use project_entity::Project;
use task_entity::Task;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub fn project_listener(db: &DatabaseConnection) -> ResourceListener<Project> {
    ResourceListener::new(db.clone())
}

pub fn task_listener(db: &DatabaseConnection) -> ResourceListener<Task> {
    ResourceListener::new(db.clone())
        .with_resolver(Arc::new(EntityResolver::new().register::<Project>()))
}

pub fn setup_test_app(db: &DatabaseConnection) -> Router {
    Router::new()
        .nest("/api/v1/projects", router(project_listener(db)))
        .nest("/api/v1/tasks", router(task_listener(db)))
}

/// Unwrap a `json!` object literal into the parameter map the listener takes.
pub fn map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateProjectAndTaskTables)]
    }
}

pub struct CreateProjectAndTaskTables;

#[async_trait::async_trait]
impl MigrationName for CreateProjectAndTaskTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_project_and_task_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateProjectAndTaskTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(schema.create_table_from_entity(project_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(task_entity::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(task_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(project_entity::Entity).to_owned())
            .await?;
        Ok(())
    }
}
