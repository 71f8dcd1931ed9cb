//! Module registry core: validation, resolution and command synthesis

pub mod command;
pub mod editor;
pub mod error;
pub mod lifecycle;
pub mod metadata;
pub mod name;
pub mod path_guard;
pub mod permissions;
pub mod resolver;

// Re-export commonly used types
pub use error::*;
pub use lifecycle::{CreatedModule, ModuleLifecycle};
pub use metadata::{ArgSpec, Descriptor, Language};
pub use name::ModuleName;
pub use resolver::{ModuleResolver, ResolvedModule, Scope};
