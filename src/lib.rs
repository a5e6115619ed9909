//! # crudlistener
//!
//! Generic REST resource listeners over Sea-ORM entities, served with Axum.
//!
//! Implement [`Resource`] for an entity, wrap a connection in a
//! [`ResourceListener`] and nest its [`router`] under the collection path:
//!
//! ```rust,ignore
//! let projects = ResourceListener::<Project>::new(db.clone());
//! let tasks = ResourceListener::<Task>::new(db.clone())
//!     .with_resolver(Arc::new(EntityResolver::new().register::<Project>()));
//!
//! let app = Router::new()
//!     .nest("/api/v1/projects", router(projects))
//!     .nest("/api/v1/tasks", router(tasks));
//! ```
//!
//! Collection GETs accept `_page`, `_limit`, `_orderBy` and `query` plus
//! implicit equality filters; see [`filtering`].

pub mod collection;
pub mod core;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod routes;

pub use self::core::{
    Association, EntityResolver, Hydrator, JsonHydrator, ReferenceResolver, RelationKind,
    Resource, ResourceListener,
};
pub use collection::Collection;
pub use errors::{ApiError, Problem};
pub use filtering::{InvalidParameter, ListDefaults};
pub use models::ListQueryParams;
pub use routes::router;
