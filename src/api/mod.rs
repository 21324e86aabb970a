//! Route groups compiled into the binary.
//!
//! Each group is served when the API folder has a directory of the same name.

pub mod echo;
pub mod hello;

use crate::routing::ModuleCatalog;

/// Catalog with every built-in route group.
pub fn catalog() -> ModuleCatalog {
    ModuleCatalog::new()
        .with_group("echo", echo::routes)
        .with_group("hello", hello::routes)
}
