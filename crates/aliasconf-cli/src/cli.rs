//! aliasconf CLI - Command-line interface for inspecting aliasconf configuration
//!
//! Usage:
//!   aliasconf get config.yaml py.run_command
//!   aliasconf expand config.yaml "cp -r {test_files} {contest_name}" --operation copytree
//!   aliasconf check config.yaml other.json

use aliasconf_core::{Config, OperationType, Value};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// aliasconf - Alias-aware configuration lookup and template expansion
#[derive(Parser)]
#[command(name = "aliasconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get the best match for a path
    Get {
        /// Configuration file
        file: PathBuf,

        /// Dotted path; segments may be keys, aliases or `*`
        path: String,

        /// Output format: text, json, yaml
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Default value if nothing matches
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Get every match for a path, best first
    Values {
        /// Configuration file
        file: PathBuf,

        /// Dotted path; segments may be keys, aliases or `*`
        path: String,

        /// Output format: text, json, yaml
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Find the shallowest nodes answering to a key
    Nearest {
        /// Configuration file
        file: PathBuf,

        /// Key or alias to search for
        key: String,
    },

    /// Expand templates against the configuration
    Expand {
        /// Configuration file
        file: PathBuf,

        /// Templates to expand, one output line each
        #[arg(required = true)]
        templates: Vec<String>,

        /// Operation type hint (e.g. copytree)
        #[arg(short, long)]
        operation: Option<String>,

        /// Extra variable, NAME=VALUE
        #[arg(short, long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
    },

    /// Report placeholders a template cannot resolve
    Validate {
        /// Configuration file
        file: PathBuf,

        /// Template to check
        template: String,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List supported languages
    Languages {
        /// Configuration file
        file: PathBuf,
    },

    /// Export the configuration with every `aliases` entry stripped
    Dump {
        /// Configuration file
        file: PathBuf,

        /// Output format: yaml, json
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Check that files parse and build into a tree
    Check {
        /// Configuration file(s) to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Run the CLI with the given arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Get {
            file,
            path,
            format,
            default,
        } => cmd_get(&file, &path, &format, default),

        Commands::Values { file, path, format } => cmd_values(&file, &path, &format),

        Commands::Nearest { file, key } => cmd_nearest(&file, &key),

        Commands::Expand {
            file,
            templates,
            operation,
            set,
        } => cmd_expand(&file, &templates, operation.as_deref(), &set),

        Commands::Validate {
            file,
            template,
            format,
        } => cmd_validate(&file, &template, &format),

        Commands::Languages { file } => cmd_languages(&file),

        Commands::Dump { file, format } => cmd_dump(&file, &format),

        Commands::Check { files } => cmd_check(files),
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

fn load_config(file: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;

    let config = if is_json(file) {
        Config::from_json(&content)
    } else {
        Config::from_yaml(&content)
    };
    config.map_err(|e| format!("Failed to load {}: {}", file.display(), e))
}

fn print_value(value: &Value, format: &str) -> Result<(), String> {
    match format {
        "json" => {
            let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
        "yaml" => {
            let yaml = serde_yaml::to_string(value).map_err(|e| e.to_string())?;
            print!("{}", yaml);
        }
        _ => match value {
            Value::String(s) => println!("{}", s),
            Value::Integer(i) => println!("{}", i),
            Value::Float(f) => println!("{}", f),
            Value::Bool(b) => println!("{}", b),
            Value::Null => println!("null"),
            _ => {
                // complex values print as YAML
                let yaml = serde_yaml::to_string(value).map_err(|e| e.to_string())?;
                print!("{}", yaml);
            }
        },
    }
    Ok(())
}

fn cmd_get(file: &Path, path: &str, format: &str, default: Option<String>) -> ExitCode {
    let config = match load_config(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    match config.get(path) {
        Ok(value) => match print_value(&value, format) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                ExitCode::from(1)
            }
        },
        Err(e) if e.is_not_found() => {
            if let Some(default_val) = default {
                println!("{}", default_val);
                ExitCode::SUCCESS
            } else {
                eprintln!("{}: Path '{}' not found", "Error".red(), path);
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_values(file: &Path, path: &str, format: &str) -> ExitCode {
    let config = match load_config(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let values = match config.get_all(path) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            return ExitCode::from(1);
        }
    };

    let printed = match format {
        "json" | "yaml" => print_value(&Value::Sequence(values), format),
        _ => values.iter().try_for_each(|v| print_value(v, format)),
    };
    match printed {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_nearest(file: &Path, key: &str) -> ExitCode {
    let config = match load_config(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let found = config.nearest(key);
    if found.is_empty() {
        eprintln!("{}: No node answers to '{}'", "Error".red(), key);
        return ExitCode::from(1);
    }

    for node in found {
        let path = config.tree().dotted_path(node.id());
        let value = config.tree().value(node.id());
        match value.to_template_string() {
            Some(text) => println!("{} = {}", path.bold(), text),
            None => println!("{} ({})", path.bold(), value.type_name()),
        }
    }
    ExitCode::SUCCESS
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("Invalid --set '{}': expected NAME=VALUE", raw)),
    }
}

fn cmd_expand(file: &Path, templates: &[String], operation: Option<&str>, set: &[String]) -> ExitCode {
    let operation = match operation.map(str::parse::<OperationType>).transpose() {
        Ok(op) => op,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            return ExitCode::from(1);
        }
    };
    let context = match set.iter().map(|s| parse_assignment(s)).collect::<Result<Vec<_>, _>>() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            return ExitCode::from(1);
        }
    };

    let config = match load_config(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    for template in templates {
        let expanded = if context.is_empty() {
            config.render(template, operation)
        } else {
            config.render_with_context(template, operation, context.iter().cloned())
        };
        println!("{}", expanded);
    }
    ExitCode::SUCCESS
}

fn cmd_validate(file: &Path, template: &str, format: &str) -> ExitCode {
    let config = match load_config(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let validation = config.validate_template(template);
    if format == "json" {
        let json = serde_json::json!({
            "valid": validation.is_valid(),
            "unresolved": validation.unresolved,
        });
        println!("{}", json);
    } else if validation.is_valid() {
        println!("{} template is valid", "✓".green());
    } else {
        eprintln!("{} Unresolved placeholders:", "✗".red());
        for name in &validation.unresolved {
            eprintln!("  {{{}}}", name);
        }
    }

    if validation.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn cmd_languages(file: &Path) -> ExitCode {
    let config = match load_config(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let registry = match config.languages() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            return ExitCode::from(1);
        }
    };

    for (name, language) in registry.iter() {
        println!("{} (.{})", name.bold(), language.extension);
        if !language.aliases.is_empty() {
            println!("  aliases: {}", language.aliases.join(", "));
        }
        if let Some(compile) = &language.compile_command {
            println!("  compile: {}", compile);
        }
        println!("  run:     {}", language.run_command);
    }
    ExitCode::SUCCESS
}

fn cmd_dump(file: &Path, format: &str) -> ExitCode {
    let config = match load_config(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let result = match format {
        "json" => config.to_json().map(|s| s + "\n"),
        _ => config.to_yaml(),
    };

    match result {
        Ok(content) => {
            print!("{}", content);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_check(files: Vec<PathBuf>) -> ExitCode {
    let mut all_valid = true;

    for file in files {
        match load_config(&file) {
            Ok(config) => {
                let stats = config.tree().stats();
                let problems = config.tree().check_integrity();
                if problems.is_empty() {
                    println!(
                        "{} {}: valid {} ({} nodes, depth {})",
                        "✓".green(),
                        file.display(),
                        if is_json(&file) { "JSON" } else { "YAML" },
                        stats.node_count,
                        stats.max_depth
                    );
                } else {
                    eprintln!("{} {}: {}", "✗".red(), file.display(), problems.join("; "));
                    all_valid = false;
                }
            }
            Err(e) => {
                eprintln!("{} {}", "✗".red(), e);
                all_valid = false;
            }
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("problem_name=a").unwrap(),
            ("problem_name".to_string(), "a".to_string())
        );
        assert_eq!(
            parse_assignment("cmd=a=b").unwrap(),
            ("cmd".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("=a").is_err());
        assert!(parse_assignment("novalue").is_err());
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(Path::new("config.json")));
        assert!(!is_json(Path::new("config.yaml")));
        assert!(!is_json(Path::new("config")));
    }

    #[test]
    fn test_cli_parses_expand() {
        let cli = Cli::try_parse_from([
            "aliasconf",
            "expand",
            "config.yaml",
            "{a}",
            "{b}",
            "--operation",
            "copytree",
            "--set",
            "a=1",
        ])
        .unwrap();

        match cli.command {
            Commands::Expand {
                templates,
                operation,
                set,
                ..
            } => {
                assert_eq!(templates, vec!["{a}", "{b}"]);
                assert_eq!(operation.as_deref(), Some("copytree"));
                assert_eq!(set, vec!["a=1"]);
            }
            _ => panic!("expected expand"),
        }
    }
}
