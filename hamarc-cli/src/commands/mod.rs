//! Command implementations for HamArc CLI.

pub mod concat;
pub mod create;
pub mod delete;
pub mod extract;
pub mod list;

pub use concat::cmd_concat;
pub use create::{cmd_append, cmd_create};
pub use delete::cmd_delete;
pub use extract::cmd_extract;
pub use list::cmd_list;
pub use test::cmd_test;
