//! Template expansion
//!
//! Expands `{name}` placeholders in command strings and paths:
//! - `{contest_name}` - replaced from the flat variable snapshot
//! - `{test_files}` - replaced by a representative of a named pattern list
//! - `{unknown}` - left untouched
//!
//! A placeholder is `{`, one or more characters other than braces, then `}`.
//! There is no nesting and no escaping. Substituted text is never scanned
//! again, so a value that itself contains `{...}` is inserted literally.

use std::borrow::Cow;

use indexmap::{IndexMap, IndexSet};

use crate::operation::OperationType;
use crate::resolver::PathResolver;
use crate::tree::ConfigTree;
use crate::value::Value;

/// A piece of a scanned template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any placeholder
    Literal(&'a str),
    /// The name between `{` and `}`
    Placeholder(&'a str),
}

/// Split a template into literal text and placeholders
pub fn scan(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while let Some(offset) = template[pos..].find('{') {
        let open = pos + offset;
        let name_start = open + 1;
        let closing = template[name_start..]
            .find(['{', '}'])
            .map(|rel| name_start + rel)
            .filter(|close| template.as_bytes()[*close] == b'}' && *close > name_start);

        match closing {
            Some(close) => {
                if literal_start < open {
                    segments.push(Segment::Literal(&template[literal_start..open]));
                }
                segments.push(Segment::Placeholder(&template[name_start..close]));
                pos = close + 1;
                literal_start = pos;
            }
            None => pos = name_start,
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    segments
}

/// Check if a string contains at least one placeholder
pub fn contains_placeholder(template: &str) -> bool {
    scan(template)
        .iter()
        .any(|s| matches!(s, Segment::Placeholder(_)))
}

/// Distinct placeholder names, in order of first appearance
pub fn extract_template_keys(template: &str) -> IndexSet<String> {
    scan(template)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.to_string()),
            Segment::Literal(_) => None,
        })
        .collect()
}

/// Rebuild `template`, replacing every placeholder for which `lookup`
/// returns a value
fn substitute<'t, F>(template: &'t str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<Cow<'t, str>>,
{
    let mut out = String::with_capacity(template.len());
    for segment in scan(template) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(name) => match lookup(name) {
                Some(replacement) => out.push_str(&replacement),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            },
        }
    }
    out
}

/// Reduce a pattern list to the single string substituted for it.
///
/// Empty list: `""`. Directory transfers: directory part of the first pattern
/// (the pattern unchanged when it has no `/`). Otherwise the first pattern.
pub fn representative_pattern(patterns: &[String], operation: Option<OperationType>) -> &str {
    let Some(first) = patterns.first() else {
        return "";
    };
    match operation {
        Some(op) if op.is_directory_transfer() => match first.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => first,
        },
        _ => first,
    }
}

/// Result of checking a template against an expander's names
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateValidation {
    /// Placeholders known to neither variables nor patterns, first appearance order
    pub unresolved: Vec<String>,
}

impl TemplateValidation {
    pub fn is_valid(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Which parts of a configuration tree feed a template snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Key of the section holding named pattern lists
    pub patterns_key: String,
    /// For pattern entries given per location, the locations tried in order
    pub pattern_locations: Vec<String>,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            patterns_key: "file_patterns".to_string(),
            pattern_locations: vec![
                "workspace".to_string(),
                "contest_current".to_string(),
                "contest_stock".to_string(),
            ],
        }
    }
}

/// Expands placeholders from a flat variable snapshot and named pattern lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateExpander {
    variables: IndexMap<String, String>,
    patterns: IndexMap<String, Vec<String>>,
}

impl TemplateExpander {
    pub fn new(variables: IndexMap<String, String>, patterns: IndexMap<String, Vec<String>>) -> Self {
        Self {
            variables,
            patterns,
        }
    }

    /// Snapshot a configuration tree.
    ///
    /// Every scalar node that is not a sequence element becomes a variable
    /// named by its key; when a key occurs several times the shallowest
    /// occurrence wins. Pattern lists come from the nearest section named
    /// `options.patterns_key`.
    pub fn from_tree(tree: &ConfigTree, options: &SnapshotOptions) -> Self {
        let mut variables = IndexMap::new();
        // nodes are stored in breadth-first order, so the first writer is the shallowest
        for node in tree.iter().skip(1) {
            if node.index().is_some() {
                continue;
            }
            if let Some(text) = tree.value(node.id()).to_template_string() {
                variables.entry(node.key().to_string()).or_insert(text);
            }
        }
        if let Some(language) = variables.get("language").cloned() {
            variables.entry("language_name".to_string()).or_insert(language);
        }

        let resolver = PathResolver::new(tree);
        let patterns = resolver
            .find_nearest_key_node(tree.root_id(), &options.patterns_key)
            .first()
            .and_then(|section| tree.value(section.id()).as_mapping())
            .map(|section| collect_patterns(section, &options.pattern_locations))
            .unwrap_or_default();

        log::debug!(
            "Template snapshot: {} variables, {} pattern lists",
            variables.len(),
            patterns.len()
        );
        Self {
            variables,
            patterns,
        }
    }

    /// A copy whose variables are extended, and overridden, by `extra`
    pub fn with_variables<K, V>(&self, extra: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut expander = self.clone();
        for (k, v) in extra {
            expander.variables.insert(k.into(), v.into());
        }
        expander
    }

    pub fn variables(&self) -> &IndexMap<String, String> {
        &self.variables
    }

    pub fn patterns(&self) -> &IndexMap<String, Vec<String>> {
        &self.patterns
    }

    /// Replace placeholders naming a variable; leave everything else
    pub fn expand_basic_variables(&self, template: &str) -> String {
        substitute(template, |name| {
            self.variables.get(name).map(|v| Cow::Owned(v.clone()))
        })
    }

    /// Replace placeholders naming a pattern list; leave everything else
    pub fn expand_file_patterns(&self, template: &str, operation: Option<OperationType>) -> String {
        substitute(template, |name| self.pattern_for(name, operation))
    }

    /// Variables first, then pattern lists, in a single pass
    pub fn expand_all(&self, template: &str, operation: Option<OperationType>) -> String {
        self.expand_all_with(template, operation, |_| None)
    }

    /// Like [`expand_all`](Self::expand_all), asking `fallback` for names
    /// that are neither variables nor patterns
    pub fn expand_all_with<F>(
        &self,
        template: &str,
        operation: Option<OperationType>,
        mut fallback: F,
    ) -> String
    where
        F: FnMut(&str) -> Option<String>,
    {
        substitute(template, |name| {
            self.variables
                .get(name)
                .map(|v| Cow::Owned(v.clone()))
                .or_else(|| self.pattern_for(name, operation))
                .or_else(|| fallback(name).map(Cow::Owned))
        })
    }

    /// Expand each argument of a command independently
    pub fn expand_command<S: AsRef<str>>(
        &self,
        args: &[S],
        operation: Option<OperationType>,
    ) -> Vec<String> {
        args.iter()
            .map(|arg| self.expand_all(arg.as_ref(), operation))
            .collect()
    }

    pub fn extract_template_keys(&self, template: &str) -> IndexSet<String> {
        extract_template_keys(template)
    }

    /// Report placeholders that neither variables nor patterns can fill
    pub fn validate_template(&self, template: &str) -> TemplateValidation {
        let unresolved = extract_template_keys(template)
            .into_iter()
            .filter(|key| !self.variables.contains_key(key) && !self.patterns.contains_key(key))
            .collect();
        TemplateValidation { unresolved }
    }

    fn pattern_for<'t>(&self, name: &str, operation: Option<OperationType>) -> Option<Cow<'t, str>> {
        self.patterns
            .get(name)
            .map(|list| Cow::Owned(representative_pattern(list, operation).to_string()))
    }
}

fn collect_patterns(
    section: &IndexMap<String, Value>,
    locations: &[String],
) -> IndexMap<String, Vec<String>> {
    let mut patterns = IndexMap::new();
    for (name, entry) in section {
        let list = match entry {
            Value::String(single) => Some(vec![single.clone()]),
            Value::Sequence(_) => entry.as_string_list(),
            Value::Mapping(per_location) => locations
                .iter()
                .filter_map(|loc| per_location.get(loc).and_then(Value::as_string_list))
                .find(|list| !list.is_empty()),
            _ => None,
        };
        match list {
            Some(list) => {
                patterns.insert(name.clone(), list);
            }
            None => log::debug!("Skipping pattern entry '{}': no usable list of strings", name),
        }
    }
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expander() -> TemplateExpander {
        let mut variables = IndexMap::new();
        variables.insert("contest_name".to_string(), "abc300".to_string());
        variables.insert("problem_name".to_string(), "a".to_string());
        variables.insert("workspace".to_string(), "/tmp/ws".to_string());
        let mut patterns = IndexMap::new();
        patterns.insert(
            "test_files".to_string(),
            vec!["test/*.in".to_string(), "test/*.out".to_string()],
        );
        patterns.insert("build_files".to_string(), vec![]);
        patterns.insert("contest_files".to_string(), vec!["main.py".to_string()]);
        TemplateExpander::new(variables, patterns)
    }

    #[test]
    fn test_scan_segments() {
        assert_eq!(
            scan("cp {a}/x {b}"),
            vec![
                Segment::Literal("cp "),
                Segment::Placeholder("a"),
                Segment::Literal("/x "),
                Segment::Placeholder("b"),
            ]
        );
    }

    #[test]
    fn test_scan_ignores_empty_and_nested_braces() {
        assert_eq!(scan("{}"), vec![Segment::Literal("{}")]);
        assert_eq!(
            scan("{{a}}"),
            vec![
                Segment::Literal("{"),
                Segment::Placeholder("a"),
                Segment::Literal("}"),
            ]
        );
        assert_eq!(scan("open {never"), vec![Segment::Literal("open {never")]);
    }

    #[test]
    fn test_scan_multibyte_text() {
        assert_eq!(
            scan("問題{problem_name}です"),
            vec![
                Segment::Literal("問題"),
                Segment::Placeholder("problem_name"),
                Segment::Literal("です"),
            ]
        );
    }

    #[test]
    fn test_expand_basic_variables() {
        let e = expander();

        assert_eq!(
            e.expand_basic_variables("{workspace}/contest_current/{contest_name}"),
            "/tmp/ws/contest_current/abc300"
        );
        assert_eq!(e.expand_basic_variables("{unknown} {test_files}"), "{unknown} {test_files}");
    }

    #[test]
    fn test_file_pattern_first_entry() {
        let e = expander();

        assert_eq!(e.expand_file_patterns("{test_files}", None), "test/*.in");
        assert_eq!(
            e.expand_file_patterns("{test_files}", Some(OperationType::Copy)),
            "test/*.in"
        );
    }

    #[test]
    fn test_file_pattern_directory_transfer() {
        let e = expander();

        assert_eq!(
            e.expand_file_patterns("{test_files}", Some(OperationType::Copytree)),
            "test"
        );
        assert_eq!(
            e.expand_file_patterns("{test_files}", Some(OperationType::Movetree)),
            "test"
        );
        // no separator: pattern unchanged
        assert_eq!(
            e.expand_file_patterns("{contest_files}", Some(OperationType::Movetree)),
            "main.py"
        );
    }

    #[test]
    fn test_file_patterns_leave_other_placeholders() {
        let e = expander();

        assert_eq!(
            e.expand_file_patterns("{unknown} {contest_name} {test_files}", None),
            "{unknown} {contest_name} test/*.in"
        );
        assert_eq!(
            e.expand_file_patterns("{unknown}", Some(OperationType::Copytree)),
            "{unknown}"
        );
    }

    #[test]
    fn test_directory_part_keeps_inner_segments() {
        let list = vec!["a/b/*.in".to_string()];
        assert_eq!(representative_pattern(&list, Some(OperationType::Copytree)), "a/b");
    }

    #[test]
    fn test_empty_pattern_list() {
        let e = expander();
        assert_eq!(e.expand_file_patterns("[{build_files}]", None), "[]");
    }

    #[test]
    fn test_expand_all_variables_then_patterns() {
        let e = expander();

        assert_eq!(
            e.expand_all("cp {workspace}/{test_files} {contest_name}/", Some(OperationType::Copytree)),
            "cp /tmp/ws/test abc300/"
        );
    }

    #[test]
    fn test_variable_value_is_not_pattern_expanded() {
        let e = expander().with_variables([("tricky", "{test_files}")]);

        assert_eq!(e.expand_all("{tricky}", None), "{test_files}");
    }

    #[test]
    fn test_expand_all_equals_basic_without_patterns() {
        let e = expander();
        let template = "{workspace}/{contest_name}_{problem_name}.py {missing}";

        assert_eq!(e.expand_all(template, None), e.expand_basic_variables(template));
    }

    #[test]
    fn test_expand_all_idempotent() {
        let e = expander();
        let once = e.expand_all("python3 {workspace}/{contest_name}/{test_files}", None);

        assert!(!contains_placeholder(&once));
        assert_eq!(e.expand_all(&once, None), once);
    }

    #[test]
    fn test_expand_command() {
        let e = expander();
        let args = ["cp", "-r", "{test_files}", "{workspace}/{contest_name}"];

        assert_eq!(
            e.expand_command(&args, Some(OperationType::Copytree)),
            vec!["cp", "-r", "test", "/tmp/ws/abc300"]
        );
    }

    #[test]
    fn test_extract_template_keys_dedups_in_order() {
        let keys = extract_template_keys("{b} {a} {b} {c}{a}");
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_validate_template() {
        let e = expander();

        let ok = e.validate_template("{contest_name}_{problem_name} {test_files}");
        assert!(ok.is_valid());

        let bad = e.validate_template("{contest_name} {nope} {also_nope} {nope}");
        assert!(!bad.is_valid());
        assert_eq!(bad.unresolved, vec!["nope", "also_nope"]);
    }

    #[test]
    fn test_with_variables_overrides() {
        let e = expander().with_variables([("contest_name", "arc100"), ("extra", "x")]);

        assert_eq!(e.expand_basic_variables("{contest_name}{extra}"), "arc100x");
        assert_eq!(expander().variables()["contest_name"], "abc300");
    }

    #[test]
    fn test_from_tree_snapshot() {
        let value: Value = serde_yaml::from_str(
            r#"
contest_name: abc300
language: python
timeout: 30
debug: true
python:
  aliases: [py]
  timeout: 10
  source_file_name: main.py
  extensions: [py]
file_patterns:
  test_files: ["test/*.in", "test/*.out"]
  contest_files:
    workspace: []
    contest_current: ["main.py"]
  single: "*.txt"
  broken: 3
"#,
        )
        .unwrap();
        let tree = ConfigTree::build(value).unwrap();
        let e = TemplateExpander::from_tree(&tree, &SnapshotOptions::default());

        assert_eq!(e.variables()["contest_name"], "abc300");
        assert_eq!(e.variables()["timeout"], "30");
        assert_eq!(e.variables()["debug"], "true");
        assert_eq!(e.variables()["source_file_name"], "main.py");
        assert_eq!(e.variables()["language_name"], "python");
        assert!(!e.variables().contains_key("0"));

        assert_eq!(e.patterns()["test_files"], vec!["test/*.in", "test/*.out"]);
        assert_eq!(e.patterns()["contest_files"], vec!["main.py"]);
        assert_eq!(e.patterns()["single"], vec!["*.txt"]);
        assert!(!e.patterns().contains_key("broken"));

        assert_eq!(
            e.expand_all("{contest_name}/{contest_files}", None),
            "abc300/main.py"
        );
    }
}
