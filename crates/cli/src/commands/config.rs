use std::env;
use std::fs;
use std::path::Path;

use lunchly_core::config::{discover_config_path, env_keys, AppConfig, LoadOptions};
use toml::Value;

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = discover_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let overrides = &options.overrides;

    let fields = [
        (
            "database.url",
            config.database.url,
            overrides.database_url.as_ref().map(|_| "--database-url"),
        ),
        ("database.max_connections", config.database.max_connections.to_string(), None),
        ("database.timeout_secs", config.database.timeout_secs.to_string(), None),
        (
            "logging.level",
            config.logging.level,
            overrides.log_level.as_ref().map(|_| "--log-level"),
        ),
        ("logging.format", format!("{:?}", config.logging.format), None),
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for (key_path, value, flag) in fields {
        let source = match flag {
            Some(flag) => format!("flag ({flag})"),
            None => field_source(
                key_path,
                env_keys(key_path),
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        };
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_vars: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env =
        env_vars.iter().find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use toml::Value;

    use super::{contains_path, field_source, render_line};

    #[test]
    fn contains_path_walks_nested_tables() {
        let doc: Value = "[database]\nurl = \"sqlite://file.db\"\n".parse().expect("valid toml");

        assert!(contains_path(&doc, "database.url"));
        assert!(!contains_path(&doc, "database.timeout_secs"));
        assert!(!contains_path(&doc, "logging.level"));
    }

    #[test]
    fn file_source_is_reported_when_key_is_in_file() {
        let doc: Value = "[logging]\nlevel = \"warn\"\n".parse().expect("valid toml");

        let source = field_source(
            "logging.level",
            &["LUNCHLY_TEST_UNSET_LEVEL_VAR"],
            Some(&doc),
            Some(Path::new("lunchly.toml")),
        );
        assert_eq!(source, "file (lunchly.toml)");

        let fallback = field_source("logging.format", &[], Some(&doc), None);
        assert_eq!(fallback, "default");
    }

    #[test]
    fn render_line_includes_source() {
        assert_eq!(
            render_line("database.url", "sqlite::memory:", "default".to_string()),
            "- database.url = sqlite::memory: (source: default)"
        );
    }
}
