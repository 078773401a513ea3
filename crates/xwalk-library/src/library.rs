//! The animation library: scene selection and timing.
//!
//! Selection order for a scene is walk first, then intro, then outro,
//! because some intros are specific to the walk they introduce.
//!
//! # Walk selection
//!
//! [`AnimationLibrary::select_walk`] runs a bounded retry loop. Each
//! attempt:
//!
//! 1. Looks up the weight schedule active right now (via the menu).
//! 2. If the schedule is exactly `{ "_": w }`, every walk is a candidate.
//! 3. Otherwise it keeps the schedule's categories that have walks, drops
//!    categories on cooldown (unless that would drop all of them), draws
//!    one category by weight, and takes that category's walks as
//!    candidates.
//! 4. Drops candidates on walk cooldown, except walks flagged
//!    `ignore_reselection` (and unless that would drop all of them).
//! 5. Picks one candidate uniformly and records it in the histories.
//!
//! If every attempt comes up empty, the literal walk `walk` is used; if
//! that is not configured either, selection fails with
//! [`ConfigError::SelectionExhausted`].

use std::collections::HashMap;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};
use xwalk_types::{ALL_WALKS, Animations, DEFAULT_SCHEDULE, MenuItem, WeightSchedule};

use crate::audio::{AudioAssets, SoundDirectory};
use crate::config;
use crate::error::{ConfigError, LibraryError};
use crate::history::History;

/// Default number of walk selection attempts before falling back.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Walk used when every selection attempt fails.
pub const FALLBACK_WALK: &str = "walk";

/// Walk name prefix that ties a walk to a matching intro.
const WALK_PREFIX: &str = "walk-";

/// Intro name prefix substituted for [`WALK_PREFIX`].
const WAIT_PREFIX: &str = "wait-";

/// The three animations making up one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSelection {
    /// Intro animation.
    pub intro: String,
    /// Walk animation.
    pub walk: String,
    /// Outro animation.
    pub outro: String,
}

/// Length in seconds of each phase of a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneDurations {
    /// Intro length.
    pub intro: f64,
    /// Walk length.
    pub walk: f64,
    /// Outro length.
    pub outro: f64,
}

impl SceneDurations {
    /// Whole scene length.
    pub fn total(&self) -> f64 {
        self.intro + self.walk + self.outro
    }
}

/// Animation catalogue with weighted, cooldown-aware selection.
pub struct AnimationLibrary {
    config: Animations,
    assets: Box<dyn AudioAssets>,
    durations: HashMap<String, f64>,
    walk_history: History,
    category_history: History,
    rng: StdRng,
}

impl AnimationLibrary {
    /// Build a library over an already parsed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: Animations, assets: Box<dyn AudioAssets>) -> Result<Self, ConfigError> {
        Self::with_rng(config, assets, StdRng::from_os_rng())
    }

    /// Build a library with an explicit random number generator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn with_rng(
        mut config: Animations,
        assets: Box<dyn AudioAssets>,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config::prepare(&mut config)?;
        Ok(Self::assemble(config, assets, rng))
    }

    /// Load the configuration file at `config_path` and read audio from
    /// `sound_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or invalid.
    pub fn from_file(config_path: &Path, sound_dir: &Path) -> Result<Self, ConfigError> {
        let config = config::load(config_path)?;
        Ok(Self::assemble(
            config,
            Box::new(SoundDirectory::new(sound_dir)),
            StdRng::from_os_rng(),
        ))
    }

    /// Wrap an already prepared configuration.
    fn assemble(config: Animations, assets: Box<dyn AudioAssets>, rng: StdRng) -> Self {
        let walk_history = History::new(config.reselection.walk_cooldown);
        let category_history = History::new(config.reselection.category_cooldown);
        Self {
            config,
            assets,
            durations: HashMap::new(),
            walk_history,
            category_history,
            rng,
        }
    }

    /// The loaded configuration.
    pub const fn config(&self) -> &Animations {
        &self.config
    }

    /// Whether `name` is in the walk catalogue.
    pub fn contains_walk(&self, name: &str) -> bool {
        self.config.walks.contains_key(name)
    }

    /// Every walk name, in catalogue order.
    pub fn walk_names(&self) -> Vec<String> {
        self.config.walks.keys().cloned().collect()
    }

    /// Recently selected walks, oldest first.
    pub const fn walk_history(&self) -> &History {
        &self.walk_history
    }

    /// Recently selected cooldown-tracked categories, oldest first.
    pub const fn category_history(&self) -> &History {
        &self.category_history
    }

    // -----------------------------------------------------------------------
    // Menu
    // -----------------------------------------------------------------------

    /// The menu item with the latest start at or before `now`.
    pub fn active_menu_item(&self, now: NaiveDateTime) -> Option<&MenuItem> {
        self.config.menu.iter().rev().find(|item| item.start <= now)
    }

    /// The weight schedule in effect at `now`: the active menu item's, or
    /// `default` when no item has started.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the named schedule is missing.
    pub fn active_weight_schedule(&self, now: NaiveDateTime) -> Result<&WeightSchedule, ConfigError> {
        let name = self
            .active_menu_item(now)
            .map_or(DEFAULT_SCHEDULE, |item| item.weights.as_str());
        self.config
            .weights
            .get(name)
            .ok_or_else(|| ConfigError::invalid(format!("weight schedule '{name}' is missing")))
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Pick an intro.
    ///
    /// A walk named `walk-X` is always introduced by `wait-X`. Anything else
    /// gets a uniformly random intro.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a random intro is needed and none
    /// are configured.
    pub fn select_intro(&mut self, walk: Option<&str>) -> Result<String, LibraryError> {
        if let Some(suffix) = walk.and_then(|w| w.strip_prefix(WALK_PREFIX)) {
            return Ok(format!("{WAIT_PREFIX}{suffix}"));
        }
        pick(&mut self.rng, &self.config.intros)
            .ok_or_else(|| ConfigError::invalid("no intro animations available").into())
    }

    /// Pick an outro uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if no outros are configured.
    pub fn select_outro(&mut self) -> Result<String, LibraryError> {
        pick(&mut self.rng, &self.config.outros)
            .ok_or_else(|| ConfigError::invalid("no outro animations available").into())
    }

    /// Pick a walk for the current local time.
    ///
    /// # Errors
    ///
    /// See [`AnimationLibrary::select_walk_at`].
    pub fn select_walk(&mut self, max_retries: u32) -> Result<String, LibraryError> {
        self.select_walk_at(Local::now().naive_local(), max_retries)
    }

    /// Pick a walk as if the local time were `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the active schedule has no
    /// category with walks, and [`ConfigError::SelectionExhausted`] if every
    /// attempt failed and [`FALLBACK_WALK`] is not configured.
    pub fn select_walk_at(
        &mut self,
        now: NaiveDateTime,
        max_retries: u32,
    ) -> Result<String, LibraryError> {
        let walk = self.choose_walk_at(now, max_retries)?;
        self.record_selection(&walk);
        Ok(walk)
    }

    /// Pick a scene and charge the cooldown histories for its walk.
    ///
    /// `walk` is played as given when present and is not charged; otherwise
    /// one is selected for the current local time. The intro follows
    /// [`AnimationLibrary::select_intro`] and the outro is random.
    ///
    /// # Errors
    ///
    /// Propagates any selection error.
    pub fn select_animation_sequence(
        &mut self,
        walk: Option<String>,
    ) -> Result<SceneSelection, LibraryError> {
        let chosen = walk.is_none();
        let selection = self.compose_sequence(walk)?;
        if chosen {
            self.record_selection(&selection.walk);
        }
        Ok(selection)
    }

    /// Pick a scene and look up the length of each phase.
    ///
    /// Cooldown histories are only charged once every duration is known,
    /// so a scene that cannot be timed leaves selection state untouched.
    ///
    /// # Errors
    ///
    /// Propagates selection errors and [`LibraryError::Asset`] for
    /// missing audio.
    pub fn select_timed_sequence(
        &mut self,
        walk: Option<String>,
    ) -> Result<(SceneSelection, SceneDurations), LibraryError> {
        let chosen = walk.is_none();
        let selection = self.compose_sequence(walk)?;
        let durations =
            self.sequence_durations(&selection.intro, &selection.walk, &selection.outro)?;
        if chosen {
            self.record_selection(&selection.walk);
        }
        Ok((selection, durations))
    }

    fn compose_sequence(&mut self, walk: Option<String>) -> Result<SceneSelection, LibraryError> {
        let walk = match walk {
            Some(walk) => walk,
            None => self.choose_walk_at(Local::now().naive_local(), DEFAULT_MAX_RETRIES)?,
        };
        let intro = self.select_intro(Some(&walk))?;
        let outro = self.select_outro()?;
        Ok(SceneSelection { intro, walk, outro })
    }

    /// The selection loop behind [`AnimationLibrary::select_walk_at`],
    /// without touching the cooldown histories.
    fn choose_walk_at(
        &mut self,
        now: NaiveDateTime,
        max_retries: u32,
    ) -> Result<String, LibraryError> {
        for attempt in 1..=max_retries {
            let weights = self.active_weight_schedule(now)?.clone();

            let (candidates, category) = if is_all_walks(&weights) {
                (self.walk_names(), None)
            } else {
                let category = self.draw_category(&weights)?;
                (self.config.walks_in_category(&category), Some(category))
            };

            if candidates.is_empty() {
                warn!(
                    attempt,
                    max_retries,
                    category = category.as_deref(),
                    "selected category has no walks, retrying"
                );
                continue;
            }

            let eligible = self.eligible_walks(candidates);
            if let Some(walk) = pick(&mut self.rng, &eligible) {
                info!(
                    walk = %walk,
                    category = category.as_deref().unwrap_or(ALL_WALKS),
                    attempt,
                    "walk selected"
                );
                return Ok(walk);
            }
            warn!(attempt, max_retries, "no eligible walk, retrying");
        }

        error!(
            attempts = max_retries,
            fallback = FALLBACK_WALK,
            "walk selection exhausted its attempts, falling back"
        );
        if !self.contains_walk(FALLBACK_WALK) {
            return Err(ConfigError::SelectionExhausted {
                attempts: max_retries,
                fallback: FALLBACK_WALK,
            }
            .into());
        }
        Ok(FALLBACK_WALK.to_owned())
    }

    // -----------------------------------------------------------------------
    // Durations
    // -----------------------------------------------------------------------

    /// Length in seconds of an animation's audio.
    ///
    /// Walks with an audio override use that file; every other animation
    /// uses its own name. Results are cached by file name.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Asset`] if no audio file is found.
    pub fn audio_duration(&mut self, animation: &str) -> Result<f64, LibraryError> {
        let filename = self
            .config
            .walks
            .get(animation)
            .map_or(animation, |walk| walk.audio_name())
            .to_owned();
        if let Some(&seconds) = self.durations.get(&filename) {
            return Ok(seconds);
        }
        let seconds = self.assets.duration(&filename)?;
        self.durations.insert(filename, seconds);
        Ok(seconds)
    }

    /// Lengths of the three phases of a scene.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Asset`] if any phase has no audio.
    pub fn sequence_durations(
        &mut self,
        intro: &str,
        walk: &str,
        outro: &str,
    ) -> Result<SceneDurations, LibraryError> {
        Ok(SceneDurations {
            intro: self.audio_duration(intro)?,
            walk: self.audio_duration(walk)?,
            outro: self.audio_duration(outro)?,
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Draw one category from `weights`, honouring category cooldown.
    fn draw_category(&mut self, weights: &WeightSchedule) -> Result<String, ConfigError> {
        let valid: Vec<(String, u32)> = weights
            .iter()
            .filter(|(category, _)| self.config.has_category(category))
            .map(|(category, &weight)| (category.clone(), weight))
            .collect();
        if valid.is_empty() {
            return Err(ConfigError::invalid(
                "no walks found for any category in the active weight schedule",
            ));
        }

        let eligible = without_cooldown(valid, "category", |(category, _)| {
            self.config.reselection.tracks(category) && self.category_history.contains(category)
        });

        weighted_pick(&mut self.rng, &eligible)
            .ok_or_else(|| ConfigError::invalid("active weight schedule has no positive weight"))
    }

    /// Drop walks on cooldown unless they ignore reselection.
    fn eligible_walks(&self, candidates: Vec<String>) -> Vec<String> {
        without_cooldown(candidates, "walk", |walk| {
            let exempt = self
                .config
                .walks
                .get(walk)
                .is_some_and(|definition| definition.ignore_reselection);
            !exempt && self.walk_history.contains(walk)
        })
    }

    /// Record a selection in the walk and category histories.
    fn record_selection(&mut self, walk: &str) {
        self.walk_history.push(walk);
        let tracked = self
            .config
            .walks
            .get(walk)
            .map(|definition| definition.category.as_str())
            .filter(|category| self.config.reselection.tracks(category));
        if let Some(category) = tracked {
            self.category_history.push(category);
        }
        debug!(
            walk_history = self.walk_history.len(),
            category_history = self.category_history.len(),
            "selection histories updated"
        );
    }
}

impl std::fmt::Debug for AnimationLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationLibrary")
            .field("walks", &self.config.walks.len())
            .field("intros", &self.config.intros.len())
            .field("outros", &self.config.outros.len())
            .field("cached_durations", &self.durations.len())
            .finish_non_exhaustive()
    }
}

/// Whether a schedule is the single-key "every walk" schedule.
fn is_all_walks(weights: &WeightSchedule) -> bool {
    weights.len() == 1 && weights.contains_key(ALL_WALKS)
}

/// Remove items on cooldown; if that removes everything, keep them all.
fn without_cooldown<T>(items: Vec<T>, kind: &str, on_cooldown: impl Fn(&T) -> bool) -> Vec<T> {
    let total = items.len();
    let (eligible, cooling): (Vec<T>, Vec<T>) = items.into_iter().partition(|item| !on_cooldown(item));
    if eligible.is_empty() && total > 0 {
        warn!(
            kind = kind,
            count = total,
            "all candidates are on cooldown, ignoring cooldown for this selection"
        );
        return cooling;
    }
    eligible
}

/// Uniformly pick one element.
fn pick(rng: &mut impl Rng, items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..items.len());
    items.get(idx).cloned()
}

/// Pick a key with probability proportional to its weight.
fn weighted_pick(rng: &mut impl Rng, weighted: &[(String, u32)]) -> Option<String> {
    let total: u64 = weighted
        .iter()
        .fold(0_u64, |acc, (_, weight)| acc.saturating_add(u64::from(*weight)));
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for (key, weight) in weighted {
        let weight = u64::from(*weight);
        if roll < weight {
            return Some(key.clone());
        }
        roll = roll.saturating_sub(weight);
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn weighted_pick_respects_zero_total() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(weighted_pick(&mut rng, &[]), None);
        assert_eq!(weighted_pick(&mut rng, &[("a".to_owned(), 0)]), None);
    }

    #[test]
    fn weighted_pick_single_key_always_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(
                weighted_pick(&mut rng, &[("only".to_owned(), 3)]).as_deref(),
                Some("only")
            );
        }
    }

    #[test]
    fn weighted_pick_tracks_weights() {
        let mut rng = StdRng::seed_from_u64(11);
        let weighted = [("heavy".to_owned(), 9), ("light".to_owned(), 1)];
        let heavy = (0..2000)
            .filter(|_| weighted_pick(&mut rng, &weighted).as_deref() == Some("heavy"))
            .count();
        // Expected 1800; allow generous slack.
        assert!((1650..=1950).contains(&heavy), "heavy picked {heavy} times");
    }

    #[test]
    fn cooldown_filter_falls_back_to_everything() {
        let items = vec!["a".to_owned(), "b".to_owned()];
        let kept = without_cooldown(items.clone(), "walk", |_| true);
        assert_eq!(kept, items);
        let kept = without_cooldown(items, "walk", |item| item == "a");
        assert_eq!(kept, vec!["b".to_owned()]);
    }

    #[test]
    fn all_walks_schedule_needs_exactly_one_key() {
        let mut weights = WeightSchedule::new();
        weights.insert(ALL_WALKS.to_owned(), 1);
        assert!(is_all_walks(&weights));
        weights.insert("cat".to_owned(), 1);
        assert!(!is_all_walks(&weights));
    }

    #[test]
    fn from_file_keeps_prepared_catalogue() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../static/data");
        let library =
            AnimationLibrary::from_file(&root.join("config.yaml"), &root.join("snd")).unwrap();
        assert!(library.contains_walk(FALLBACK_WALK));
        assert!(
            library
                .config()
                .walks
                .iter()
                .all(|(name, walk)| &walk.name == name)
        );
        assert!(library.walk_history().is_empty());
    }
}
