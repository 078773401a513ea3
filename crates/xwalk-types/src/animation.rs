//! Animation configuration model.
//!
//! Mirrors the declarative animation configuration file: the intro and outro
//! pools, the walk catalogue with its categories, the named weight
//! schedules, the time-based menu that picks the active schedule, and the
//! reselection cooldown parameters. The controller loads it once at startup
//! and returns it verbatim in every API response so clients can introspect
//! the catalogue.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Weight-schedule key meaning "every walk, uniformly".
///
/// Also accepted by the `queue_walk` API request to queue the whole catalogue.
pub const ALL_WALKS: &str = "_";

/// Name of the weight schedule used when no menu item has started yet.
pub const DEFAULT_SCHEDULE: &str = "default";

/// A walk category tag such as `cat` or `language`.
///
/// Categories are designer-defined in the configuration file; weight
/// schedules and cooldown lists refer to them by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Category(pub String);

impl Category {
    /// The category tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Category {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Category {
    fn from(tag: &str) -> Self {
        Self(tag.to_owned())
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A walk in the catalogue.
///
/// The walk's name is its key in [`Animations::walks`]; the loader copies it
/// into [`WalkDefinition::name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WalkDefinition {
    /// Walk name (also the animation and default audio name).
    #[serde(default)]
    pub name: String,
    /// Category this walk belongs to.
    pub category: Category,
    /// Audio file stem to play instead of the walk's own name.
    #[serde(default)]
    pub audio: Option<String>,
    /// When set, the walk is exempt from walk-level cooldown filtering.
    #[serde(default)]
    pub ignore_reselection: bool,
}

impl WalkDefinition {
    /// The audio file stem for this walk: the override if present,
    /// otherwise the walk name.
    pub fn audio_name(&self) -> &str {
        self.audio.as_deref().unwrap_or(&self.name)
    }
}

/// Category name (or [`ALL_WALKS`]) to positive integer weight.
pub type WeightSchedule = BTreeMap<String, u32>;

/// One entry of the time-based menu.
///
/// From `start` onward (until a later item starts) the weight schedule
/// named `weights` is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MenuItem {
    /// Local wall-clock start time.
    #[serde(with = "menu_time")]
    #[ts(type = "string")]
    pub start: NaiveDateTime,
    /// Name of the weight schedule activated at `start`.
    pub weights: String,
}

/// Reselection cooldown parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReselectionConfig {
    /// How many recently selected walks are kept off the table.
    #[serde(default)]
    pub walk_cooldown: usize,
    /// How many recently selected cooldown-tracked categories are kept off
    /// the table.
    #[serde(default)]
    pub category_cooldown: usize,
    /// Categories subject to category cooldown. Others are never filtered.
    #[serde(default)]
    pub cooldown_categories: Vec<Category>,
}

impl ReselectionConfig {
    /// Whether `category` is tracked for category cooldown.
    pub fn tracks(&self, category: &str) -> bool {
        self.cooldown_categories.iter().any(|c| c.as_str() == category)
    }
}

/// The complete animation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Animations {
    /// Intro animation names.
    #[serde(default)]
    pub intros: Vec<String>,
    /// Outro animation names.
    #[serde(default)]
    pub outros: Vec<String>,
    /// Walk catalogue keyed by walk name.
    #[serde(default)]
    pub walks: BTreeMap<String, WalkDefinition>,
    /// Named weight schedules.
    #[serde(default)]
    pub weights: BTreeMap<String, WeightSchedule>,
    /// Time-based menu, kept sorted ascending by start time.
    #[serde(default)]
    pub menu: Vec<MenuItem>,
    /// Cooldown parameters.
    #[serde(default)]
    pub reselection: ReselectionConfig,
}

impl Animations {
    /// Names of walks belonging to `category`, in catalogue order.
    pub fn walks_in_category(&self, category: &str) -> Vec<String> {
        self.walks
            .iter()
            .filter(|(_, walk)| walk.category.as_str() == category)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Whether at least one walk belongs to `category`.
    pub fn has_category(&self, category: &str) -> bool {
        self.walks.values().any(|walk| walk.category.as_str() == category)
    }
}

/// Menu start times: written as `YYYY-MM-DD HH:MM:SS`, read in that form or
/// with a `T` separator.
mod menu_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    const READ_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(WRITE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim();
        READ_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            .ok_or_else(|| {
                <D::Error as serde::de::Error>::custom(format!("invalid menu start time: {raw}"))
            })
    }
}
