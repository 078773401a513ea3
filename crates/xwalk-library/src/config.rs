//! Loading and validating the animation configuration.
//!
//! The configuration lives in a YAML file (by default
//! `static/data/config.yaml`). Loading is all-or-nothing: a missing file,
//! bad YAML, or a configuration that could never produce a scene is a
//! [`ConfigError`], and the controller refuses to start. Softer problems
//! (a weight schedule naming a category that has no walks) are logged and
//! tolerated.

use std::path::Path;

use tracing::{info, warn};
use xwalk_types::{ALL_WALKS, Animations, DEFAULT_SCHEDULE};

use crate::error::ConfigError;

/// Read and validate an animation configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read,
/// [`ConfigError::Yaml`] if it is not valid YAML for the model, or
/// [`ConfigError::Invalid`] if it violates an invariant.
pub fn load(path: &Path) -> Result<Animations, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&contents)?;
    info!(
        path = %path.display(),
        intros = config.intros.len(),
        walks = config.walks.len(),
        outros = config.outros.len(),
        schedules = config.weights.len(),
        menu_items = config.menu.len(),
        "animation config loaded"
    );
    Ok(config)
}

/// Parse and validate an animation configuration from a YAML string.
///
/// # Errors
///
/// Returns [`ConfigError::Yaml`] or [`ConfigError::Invalid`].
pub fn parse(yaml: &str) -> Result<Animations, ConfigError> {
    let mut config: Animations = serde_yml::from_str(yaml)?;
    prepare(&mut config)?;
    Ok(config)
}

/// Normalise a configuration in place and check its invariants.
///
/// Copies each walk's catalogue key into its `name`, sorts the menu by start
/// time, and then validates. Safe to call more than once.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when:
/// - no walks are defined
/// - no outros are defined
/// - there is no `default` weight schedule
/// - a menu item names an unknown weight schedule
/// - a weight is zero
pub fn prepare(config: &mut Animations) -> Result<(), ConfigError> {
    for (name, walk) in &mut config.walks {
        walk.name.clone_from(name);
    }
    config.menu.sort_by(|a, b| a.start.cmp(&b.start));

    if config.walks.is_empty() {
        return Err(ConfigError::invalid("no walks are defined"));
    }
    if config.outros.is_empty() {
        return Err(ConfigError::invalid("no outros are defined"));
    }
    if config.intros.is_empty() {
        warn!("no intros are defined; only walks with a matching wait animation can play");
    }
    if !config.weights.contains_key(DEFAULT_SCHEDULE) {
        return Err(ConfigError::invalid(format!(
            "weight schedule '{DEFAULT_SCHEDULE}' is missing"
        )));
    }
    for item in &config.menu {
        if !config.weights.contains_key(&item.weights) {
            return Err(ConfigError::invalid(format!(
                "menu item at {} refers to unknown weight schedule '{}'",
                item.start, item.weights
            )));
        }
    }

    for (schedule, weights) in &config.weights {
        for (category, &weight) in weights {
            if weight == 0 {
                return Err(ConfigError::invalid(format!(
                    "weight schedule '{schedule}' gives category '{category}' a zero weight"
                )));
            }
            if category != ALL_WALKS && !config.has_category(category) {
                warn!(
                    schedule = schedule,
                    category = category,
                    "weight schedule refers to a category with no walks"
                );
            }
        }
    }
    for category in &config.reselection.cooldown_categories {
        if !config.has_category(category.as_str()) {
            warn!(
                category = %category,
                "cooldown category has no walks"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
intros: [wait]
outros: [stop]
walks:
  walk:
    category: standard
weights:
  default:
    _: 1
"#;

    #[test]
    fn parse_minimal_yaml() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.walks.len(), 1);
        assert_eq!(config.walks["walk"].name, "walk");
        assert!(config.menu.is_empty());
        assert_eq!(config.reselection.walk_cooldown, 0);
    }

    #[test]
    fn parse_full_yaml_sorts_menu() {
        let yaml = r#"
intros: [wait, wait-long]
outros: [stop, stop-fade]
walks:
  walk:
    category: standard
  walk-danish:
    category: language
    audio: danish
  walk-cat:
    category: cat
    ignore_reselection: true
weights:
  default:
    standard: 5
    language: 2
    cat: 1
  party:
    _: 1
menu:
  - start: "2025-12-31 22:00:00"
    weights: party
  - start: "2025-12-24T18:00:00"
    weights: default
reselection:
  walk_cooldown: 2
  category_cooldown: 1
  cooldown_categories: [language]
"#;
        let config = parse(yaml).unwrap();
        assert_eq!(config.walks["walk-danish"].audio.as_deref(), Some("danish"));
        assert!(config.walks["walk-cat"].ignore_reselection);
        assert_eq!(config.menu.len(), 2);
        assert!(config.menu[0].start < config.menu[1].start);
        assert_eq!(config.menu[0].weights, "default");
        assert!(config.reselection.tracks("language"));
    }

    #[test]
    fn rejects_missing_default_schedule() {
        let yaml = MINIMAL.replace("default:", "weekday:");
        assert!(matches!(parse(&yaml), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_empty_catalogue() {
        let yaml = "outros: [stop]\nweights:\n  default:\n    _: 1\n";
        assert!(matches!(parse(yaml), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_missing_outros() {
        let yaml = MINIMAL.replace("outros: [stop]", "outros: []");
        assert!(matches!(parse(&yaml), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_zero_weight() {
        let yaml = MINIMAL.replace("_: 1", "_: 0");
        assert!(matches!(parse(&yaml), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_menu_with_unknown_schedule() {
        let yaml = format!("{MINIMAL}menu:\n  - start: \"2025-01-01 00:00:00\"\n    weights: nope\n");
        assert!(matches!(parse(&yaml), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn tolerates_category_without_walks() {
        let yaml = MINIMAL.replace("_: 1", "standard: 3\n    ghost: 1");
        assert!(parse(&yaml).is_ok());
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(parse("walks: [unclosed"), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn bundled_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../static/data/config.yaml");
        let config = load(&path).unwrap();
        assert!(config.walks.contains_key("walk"));
        assert!(config.menu.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load(Path::new("/definitely/not/here/config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
