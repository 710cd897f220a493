//! Static analysis of generated scene scripts.
//!
//! This crate provides:
//! - Syntax validation of Python scene scripts (tree-sitter)
//! - Entry-scene discovery against a target profile
//! - Import detection

pub mod error;
pub mod parser;
pub mod scene;

pub use error::{ScriptError, ScriptResult, SyntaxIssue};
pub use parser::check_syntax;
pub use scene::{find_entry_scene, has_library_import};
