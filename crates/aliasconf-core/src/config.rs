//! Main Config type for aliasconf
//!
//! The Config type is the primary interface for looking up merged
//! configuration data by alias-aware dotted paths and rendering templates
//! against it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::builder::{TreeBuilder, DEFAULT_ROOT_KEY};
use crate::error::{Error, Result};
use crate::language::LanguageRegistry;
use crate::operation::OperationType;
use crate::path::ConfigPath;
use crate::resolver::PathResolver;
use crate::template::{SnapshotOptions, TemplateExpander, TemplateValidation};
use crate::tree::{ConfigNode, ConfigTree};
use crate::value::Value;

/// Configuration options for building a Config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOptions {
    /// Key of the synthetic root node
    pub root_key: String,
    /// Section holding named file pattern lists
    pub patterns_key: String,
    /// Section holding language records
    pub languages_key: String,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            root_key: DEFAULT_ROOT_KEY.to_string(),
            patterns_key: "file_patterns".to_string(),
            languages_key: "languages".to_string(),
        }
    }
}

type RenderKey = (String, Option<OperationType>);

/// Rendered templates kept before the render cache starts over
pub const RENDER_CACHE_CAPACITY: usize = 1024;

/// The main configuration container
///
/// Cloning is cheap: the raw value, the built tree and the render cache are
/// shared.
#[derive(Debug, Clone)]
pub struct Config {
    /// The merged input data
    raw: Arc<Value>,
    /// Tree built from `raw`
    tree: Arc<ConfigTree>,
    /// Variable and pattern snapshot of `tree`
    expander: Arc<TemplateExpander>,
    /// Cache of rendered templates
    cache: Arc<RwLock<HashMap<RenderKey, String>>>,
    /// Configuration options
    options: ConfigOptions,
}

impl Config {
    /// Build a Config from a merged value
    pub fn new(value: Value) -> Result<Self> {
        Self::with_options(value, ConfigOptions::default())
    }

    /// Build a Config with custom options
    pub fn with_options(value: Value, options: ConfigOptions) -> Result<Self> {
        let tree = TreeBuilder::new()
            .with_root_key(options.root_key.clone())
            .build(value.clone())?;
        let snapshot = SnapshotOptions {
            patterns_key: options.patterns_key.clone(),
            ..SnapshotOptions::default()
        };
        let expander = TemplateExpander::from_tree(&tree, &snapshot);

        Ok(Self {
            raw: Arc::new(value),
            tree: Arc::new(tree),
            expander: Arc::new(expander),
            cache: Arc::new(RwLock::new(HashMap::new())),
            options,
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| Error::parse(e.to_string()))?;
        Self::new(value)
    }

    /// Load configuration from a YAML string with options
    pub fn from_yaml_with_options(yaml: &str, options: ConfigOptions) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| Error::parse(e.to_string()))?;
        Self::with_options(value, options)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| Error::parse(e.to_string()))?;
        Self::new(value)
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// The merged input, `aliases` entries included
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.tree)
    }

    /// Get the value of the best match for a dotted path
    ///
    /// Segments match node keys, declared aliases, or `*` for any child.
    pub fn get(&self, path: &str) -> Result<Value> {
        let parsed = ConfigPath::parse(path)?;
        self.resolver()
            .resolve_best(self.tree.root_id(), parsed.segments())
            .map(|node| self.tree.value(node.id()).clone())
    }

    /// Get a value, falling back to `default` when nothing matches
    pub fn get_or(&self, path: &str, default: Value) -> Value {
        match ConfigPath::parse(path) {
            Ok(parsed) => {
                self.resolver()
                    .resolve_value(self.tree.root_id(), parsed.segments(), default)
            }
            Err(_) => default,
        }
    }

    /// Get the values of every match for a dotted path, best first
    pub fn get_all(&self, path: &str) -> Result<Vec<Value>> {
        let parsed = ConfigPath::parse(path)?;
        let values: Vec<Value> = self
            .resolver()
            .resolve_values(self.tree.root_id(), parsed.segments())
            .into_iter()
            .cloned()
            .collect();
        if values.is_empty() {
            return Err(Error::not_found(path));
        }
        Ok(values)
    }

    /// Get a string value, with type coercion if needed
    pub fn get_string(&self, path: &str) -> Result<String> {
        let value = self.get(path)?;
        match value {
            Value::String(s) => Ok(s),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok("null".to_string()),
            _ => Err(Error::type_coercion(path, "string", value.type_name())),
        }
    }

    /// Get an integer value, with type coercion if needed
    pub fn get_i64(&self, path: &str) -> Result<i64> {
        let value = self.get(path)?;
        match value {
            Value::Integer(i) => Ok(i),
            Value::String(s) => s
                .parse()
                .map_err(|_| Error::type_coercion(path, "integer", format!("string (\"{}\")", s))),
            _ => Err(Error::type_coercion(path, "integer", value.type_name())),
        }
    }

    /// Get a float value, with type coercion if needed
    pub fn get_f64(&self, path: &str) -> Result<f64> {
        let value = self.get(path)?;
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            Value::String(s) => s
                .parse()
                .map_err(|_| Error::type_coercion(path, "float", format!("string (\"{}\")", s))),
            _ => Err(Error::type_coercion(path, "float", value.type_name())),
        }
    }

    /// Get a boolean value; strings coerce only from "true" and "false"
    pub fn get_bool(&self, path: &str) -> Result<bool> {
        let value = self.get(path)?;
        match value {
            Value::Bool(b) => Ok(b),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(Error::type_coercion(
                    path,
                    "boolean",
                    format!("string (\"{}\") - only \"true\" or \"false\" allowed", s),
                )),
            },
            _ => Err(Error::type_coercion(path, "boolean", value.type_name())),
        }
    }

    /// Get a sequence value
    pub fn get_list(&self, path: &str) -> Result<Vec<Value>> {
        let value = self.get(path)?;
        match value {
            Value::Sequence(items) => Ok(items),
            _ => Err(Error::type_coercion(path, "list", value.type_name())),
        }
    }

    /// Shallowest nodes answering to `key`, searched from the root
    pub fn nearest(&self, key: &str) -> Vec<&ConfigNode> {
        self.resolver()
            .find_nearest_key_node(self.tree.root_id(), key)
    }

    /// Variable and pattern snapshot used by [`render`](Self::render)
    pub fn expander(&self) -> &TemplateExpander {
        &self.expander
    }

    /// Expand a template against this configuration.
    ///
    /// Placeholders are filled from variables, then pattern lists, then by
    /// resolving the placeholder as a dotted path to a scalar
    /// (`{python.run_command}`). Results are cached per template and
    /// operation; the cache is emptied once it holds
    /// [`RENDER_CACHE_CAPACITY`] entries.
    pub fn render(&self, template: &str, operation: Option<OperationType>) -> String {
        let key = (template.to_string(), operation);
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = cache.get(&key) {
                return cached.clone();
            }
        }

        log::debug!("Render cache miss for '{}'", template);
        let rendered = self
            .expander
            .expand_all_with(template, operation, |name| self.scalar_at(name));

        {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            if cache.len() >= RENDER_CACHE_CAPACITY {
                log::debug!("Render cache full ({} entries), clearing", cache.len());
                cache.clear();
            }
            cache.insert(key, rendered.clone());
        }
        rendered
    }

    /// Like [`render`](Self::render), with `context` overriding the snapshot
    /// variables. Not cached.
    pub fn render_with_context<K, V>(
        &self,
        template: &str,
        operation: Option<OperationType>,
        context: impl IntoIterator<Item = (K, V)>,
    ) -> String
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.expander
            .with_variables(context)
            .expand_all_with(template, operation, |name| self.scalar_at(name))
    }

    /// Placeholders of `template` that [`render`](Self::render) cannot fill
    pub fn validate_template(&self, template: &str) -> TemplateValidation {
        let mut validation = self.expander.validate_template(template);
        validation
            .unresolved
            .retain(|name| self.scalar_at(name).is_none());
        validation
    }

    fn scalar_at(&self, path: &str) -> Option<String> {
        let parsed = ConfigPath::parse(path).ok()?;
        if parsed.is_empty() {
            return None;
        }
        self.resolver()
            .resolve_best(self.tree.root_id(), parsed.segments())
            .ok()
            .and_then(|node| self.tree.value(node.id()).to_template_string())
    }

    /// Clear the render cache
    pub fn clear_cache(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.clear();
    }

    /// Built-in languages overlaid with the configured language section
    pub fn languages(&self) -> Result<LanguageRegistry> {
        let mut registry = LanguageRegistry::with_defaults();
        let section = self
            .raw
            .as_mapping()
            .and_then(|root| root.get(&self.options.languages_key));
        if let Some(section) = section {
            registry
                .extend_from_value(section)
                .map_err(|e| match e.path.clone() {
                    Some(name) => e.with_path(format!("{}.{}", self.options.languages_key, name)),
                    None => e.with_path(self.options.languages_key.clone()),
                })?;
        }
        Ok(registry)
    }

    /// Export the tree's root value as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self.tree.root_value()).map_err(|e| Error::parse(e.to_string()))
    }

    /// Export the tree's root value as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self.tree.root_value())
            .map_err(|e| Error::parse(e.to_string()))
    }
}
