//! # Resource Core
//!
//! The [`Resource`] contract an entity implements, the [`ResourceListener`]
//! that maps REST verbs onto it, and the two seams the listener delegates to:
//! a [`Hydrator`] for map/model conversion and a [`ReferenceResolver`] for
//! to-one association fields.

pub mod hydrator;
pub mod listener;
pub mod resolver;
pub mod traits;

pub use hydrator::{Hydrator, JsonHydrator};
pub use listener::ResourceListener;
pub use resolver::{EntityResolver, ReferenceResolver};
pub use traits::{Association, RelationKind, Resource};
