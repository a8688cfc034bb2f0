//! # ferrous-inject
//!
//! Function-wiring dependency injection for Rust: register plain functions
//! as providers, hand the container an invoker, and it calls every provider
//! the invoker needs, in dependency order, exactly once.
//!
//! ## Features
//!
//! - **Functions as providers**: parameters are dependencies, return values are provided types
//! - **Aggregates**: many dependencies or outputs behind one struct, with optional fields
//! - **Auto-groups**: many providers of `T`, consumed together as `Vec<T>`
//! - **Scopes**: providers bound to a scope, per-scope types consumed as `HashMap<Scope, T>`,
//!   and scope-parameterized providers that run once per calling scope
//! - **Diagnostics**: cycle detection with the full path, an indented build log,
//!   and a dependency graph rendered as DOT or Mermaid
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_inject::{build, configs, injectable, provide};
//!
//! #[derive(Clone)]
//! struct Database {
//!     connection_string: String,
//! }
//!
//! #[derive(Clone)]
//! struct UserService {
//!     db: Database,
//! }
//!
//! injectable!(Database, UserService);
//!
//! build(
//!     |users: UserService| {
//!         assert_eq!(users.db.connection_string, "postgres://localhost");
//!     },
//!     configs([
//!         provide(|| Database { connection_string: "postgres://localhost".to_string() }),
//!         provide(|db: Database| UserService { db }),
//!     ]),
//! ).unwrap();
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use std::collections::HashMap;
//! use ferrous_inject::{build, configs, declare_per_scope, provide, provide_with_scope, Scope};
//!
//! let (a, b) = (Scope::new("a"), Scope::new("b"));
//!
//! build(
//!     |ids: HashMap<Scope, String>| {
//!         assert_eq!(ids.len(), 2);
//!         assert!(ids.values().any(|id| id == "id-a"));
//!     },
//!     configs([
//!         declare_per_scope::<String>(),
//!         // runs once for every scope that asks for a u64
//!         provide(|scope: Scope| scope.name().len() as u64),
//!         provide_with_scope(&a, |_: u64| "id-a".to_string()),
//!         provide_with_scope(&b, |_: u64| "id-b".to_string()),
//!     ]),
//! ).unwrap();
//! ```
//!
//! ## Errors
//!
//! Nothing panics on a wiring problem; [`build`] returns an [`InjectError`]
//! describing it, and the debug options in [`debug`] show how far the build got.

pub mod aggregate;
pub mod config;
pub mod debug;
pub mod descriptors;
pub mod error;
pub mod graph_export;
pub mod key;
pub mod location;
pub mod options;
pub mod reflect;
pub mod scope;
pub mod slots;

// Internal modules
mod container;
mod internal;
mod registration;
mod resolver;

pub use aggregate::{AggregateInput, AggregateOutput};
pub use config::{DebugSettings, LogTarget};
pub use container::{build, build_debug, inject, inject_debug};
pub use debug::{
    auto_debug, debug_cleanup, debug_options, export_visualizer, file_dump_visualizer, file_visualizer,
    log_visualizer, logger, on_error, on_success, stdout_logger, tracing_logger, visualizer, DebugOption,
};
pub use descriptors::{downcast, into_value, AnyValue, InputSlot, OutputSlot, ProviderDescriptor, Thunk};
pub use error::{BoxError, ErrorKind, InjectError, InjectResult, MisuseKind};
pub use graph_export::{DependencyGraph, ExportFormat, GraphEdge, GraphExporter, GraphNode, NodeKind, NodeStatus};
pub use key::TypeKey;
pub use location::Location;
pub use options::{
    configs, debug_config, declare_auto_group, declare_per_scope, error, provide, provide_with_scope, supply,
    Config,
};
pub use reflect::{IntoDescriptor, ProviderSet};
pub use scope::Scope;
pub use slots::{FromSlots, IntoSlots, Outputs, SlotValues};
