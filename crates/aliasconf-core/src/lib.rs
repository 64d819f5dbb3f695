//! aliasconf-core: alias-aware configuration trees and template expansion
//!
//! This crate builds a tree from merged configuration data, resolves lookup
//! paths against it using exact keys, declared aliases and wildcards, and
//! expands `{name}` placeholders in command templates.
//!
//! # Example
//!
//! ```rust
//! use aliasconf_core::Config;
//!
//! let yaml = r#"
//! python:
//!   aliases: [py, python3]
//!   run_command: python3 main.py
//! contest_name: abc300
//! "#;
//!
//! let config = Config::from_yaml(yaml).unwrap();
//! assert_eq!(
//!     config.get("py.run_command").unwrap().as_str(),
//!     Some("python3 main.py")
//! );
//! assert_eq!(config.render("cd {contest_name}", None), "cd abc300");
//! ```

pub mod builder;
pub mod error;
pub mod language;
pub mod operation;
pub mod path;
pub mod resolver;
pub mod template;
pub mod tree;
pub mod value;

mod config;

pub use builder::TreeBuilder;
pub use config::{Config, ConfigOptions, RENDER_CACHE_CAPACITY};
pub use error::{Error, ErrorKind, Result};
pub use language::{LanguageConfig, LanguageRegistry};
pub use operation::OperationType;
pub use path::ConfigPath;
pub use resolver::PathResolver;
pub use template::{SnapshotOptions, TemplateExpander, TemplateValidation};
pub use tree::{ConfigNode, ConfigTree, NodeId};
pub use value::Value;
