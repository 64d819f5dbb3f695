//! End-to-end tests: merged YAML in, lookups and expanded commands out

use aliasconf_core::resolver::{ALIAS_SCORE, EXACT_SCORE, WILDCARD_SCORE};
use aliasconf_core::{
    Config, ConfigTree, ErrorKind, LanguageRegistry, OperationType, PathResolver, TemplateExpander,
    Value,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;

const CONTEST_CONFIG: &str = r#"
contest_name: abc300
problem_name: a
language: python
workspace: ./workspace
container:
  aliases: [docker, podman]
  config: container_config
python:
  aliases: [py, python3]
  run: python3
  source_file_name: main.py
commands:
  open:
    aliases: [o]
    steps:
      - type: copytree
        cmd: ["{contest_stock}/{test_files}", "{workspace}/{test_files}"]
      - type: shell
        cmd: ["{python.run}", "{source_file_name}"]
file_patterns:
  test_files: ["test/*.in", "test/*.out"]
  contest_files:
    workspace: ["main.py"]
contest_stock: ./contest_stock
"#;

fn yaml(src: &str) -> Value {
    serde_yaml::from_str(src).unwrap()
}

mod resolution {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_alias_lookup_through_container() {
        let tree = ConfigTree::build(yaml(CONTEST_CONFIG)).unwrap();
        let resolver = PathResolver::new(&tree);

        assert_eq!(
            resolver.resolve_value(tree.root_id(), &["docker", "config"], Value::Null),
            Value::from("container_config")
        );
        assert_eq!(
            resolver.resolve_value(tree.root_id(), &["podman", "config"], Value::Null),
            Value::from("container_config")
        );
    }

    #[test]
    fn test_every_alias_route_agrees() {
        let tree = ConfigTree::build(yaml(CONTEST_CONFIG)).unwrap();
        let resolver = PathResolver::new(&tree);
        let root = tree.root_id();

        let by_py = resolver.resolve_value(root, &["py", "run"], Value::Null);
        let by_python3 = resolver.resolve_value(root, &["python3", "run"], Value::Null);
        assert_eq!(by_py, by_python3);
        assert_eq!(by_py, Value::from("python3"));
    }

    #[test]
    fn test_missing_top_level_key_uses_default() {
        let tree = ConfigTree::build(yaml(CONTEST_CONFIG)).unwrap();
        let resolver = PathResolver::new(&tree);

        assert_eq!(
            resolver.resolve_value(tree.root_id(), &["nonexistent"], Value::from("fallback")),
            Value::from("fallback")
        );
    }

    #[test]
    fn test_wildcard_reaches_nested_steps() {
        let config = Config::from_yaml(CONTEST_CONFIG).unwrap();

        let types = config.get_all("commands.o.steps.*.type").unwrap();
        assert_eq!(types, vec![Value::from("copytree"), Value::from("shell")]);
    }

    #[test]
    fn test_scores_are_ordered() {
        assert!(EXACT_SCORE > ALIAS_SCORE);
        assert!(ALIAS_SCORE > WILDCARD_SCORE);
        assert!(WILDCARD_SCORE > 0);
    }

    #[test]
    fn test_results_only_contain_matching_nodes() {
        let tree = ConfigTree::build(yaml(CONTEST_CONFIG)).unwrap();
        let resolver = PathResolver::new(&tree);

        for node in resolver.resolve_by_match_descending(tree.root_id(), &["*", "*"]) {
            let parent = tree.parent(node.id()).unwrap();
            assert!(node.matches().contains("*"));
            assert!(parent.matches().contains("*"));
            assert_eq!(tree.depth(node.id()), 2);
        }
    }

    #[test]
    fn test_nearest_key_is_shallowest() {
        let tree = ConfigTree::build(yaml(CONTEST_CONFIG)).unwrap();
        let resolver = PathResolver::new(&tree);

        let found = resolver.find_nearest_key_node(tree.root_id(), "type");
        assert_eq!(found.len(), 2);
        let depths: Vec<_> = found.iter().map(|n| tree.depth(n.id())).collect();
        assert_eq!(depths, vec![depths[0]; 2]);

        let nothing = resolver.find_nearest_key_node(tree.root_id(), "absent");
        assert!(nothing.is_empty());
        assert!(resolver
            .nearest_key_node(tree.root_id(), "absent")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_invalid_aliases_rejected() {
        let err = ConfigTree::build(yaml(r#"{"aliases": "not-a-list"}"#)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAliases);
    }

    #[test]
    fn test_tree_integrity_holds() {
        let tree = ConfigTree::build(yaml(CONTEST_CONFIG)).unwrap();

        assert!(tree.check_integrity().is_empty());
        assert_eq!(tree.stats().node_count, tree.len());
    }
}

mod expansion {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pattern_extraction_by_operation() {
        let mut patterns = IndexMap::new();
        patterns.insert(
            "test_files".to_string(),
            vec!["test/*.in".to_string(), "test/*.out".to_string()],
        );
        let expander = TemplateExpander::new(IndexMap::new(), patterns);

        assert_eq!(expander.expand_file_patterns("{test_files}", None), "test/*.in");
        assert_eq!(
            expander.expand_file_patterns("{test_files}", Some(OperationType::Copytree)),
            "test"
        );
    }

    #[test]
    fn test_step_commands_render() {
        let config = Config::from_yaml(CONTEST_CONFIG).unwrap();
        let steps = config.get_list("commands.open.steps").unwrap();

        let rendered: Vec<Vec<String>> = steps
            .iter()
            .map(|step| {
                let step = step.as_mapping().unwrap();
                let op: OperationType = step["type"].as_str().unwrap().parse().unwrap();
                step["cmd"]
                    .as_string_list()
                    .unwrap()
                    .iter()
                    .map(|arg| config.render(arg, Some(op)))
                    .collect()
            })
            .collect();

        assert_eq!(
            rendered,
            vec![
                vec!["./contest_stock/test", "./workspace/test"],
                vec!["python3", "main.py"],
            ]
        );
    }

    #[test]
    fn test_expand_command_matches_render_for_snapshot_names() {
        let config = Config::from_yaml(CONTEST_CONFIG).unwrap();
        let args = ["cd", "{workspace}/{contest_name}_{problem_name}"];

        let expanded = config.expander().expand_command(&args, None);
        assert_eq!(expanded, vec!["cd", "./workspace/abc300_a"]);
        assert_eq!(config.render(args[1], None), expanded[1]);
    }

    #[test]
    fn test_rendered_output_is_stable() {
        let config = Config::from_yaml(CONTEST_CONFIG).unwrap();
        let once = config.render("{workspace}/{contest_files} {unknown}", None);

        assert_eq!(once, "./workspace/main.py {unknown}");
        assert_eq!(config.render(&once, None), once);
    }
}

mod languages {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registry_is_per_instance() {
        let mut first = LanguageRegistry::with_defaults();
        let second = LanguageRegistry::with_defaults();

        first.get_language_config_mut("py").unwrap().run_command = "pypy3".into();

        assert_eq!(first.get_run_command("python"), "pypy3");
        assert_eq!(second.get_run_command("python"), "python3");
    }
}
