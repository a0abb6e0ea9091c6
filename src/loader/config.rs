//! Match configuration, difficulty table and persisted preferences

use crate::game::dice::RandomSource;
use crate::game::probability::{ActionProbabilities, QuestionModifier};
use crate::{QuizballError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Durations of every staged transition, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Delay before the dribbler exchanges slots
    pub dribble_swap_ms: u64,
    /// Delay after the swap before non-holder stances settle
    pub dribble_settle_ms: u64,
    /// "Shooting..." suspense before the shot is rolled
    pub shot_suspense_ms: u64,
    /// Keeper holds the saved ball before the restart
    pub save_restart_ms: u64,
    pub celebration_ms: u64,
    /// Keeper waits before distributing to a midfielder
    pub keeper_distribution_ms: u64,
    pub opponent_thinking_ms: u64,
    pub message_clear_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            dribble_swap_ms: 16,
            dribble_settle_ms: 50,
            shot_suspense_ms: 3000,
            save_restart_ms: 2000,
            celebration_ms: 5000,
            keeper_distribution_ms: 1000,
            opponent_thinking_ms: 1000,
            message_clear_ms: 3000,
        }
    }
}

/// Everything that parameterizes one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub probabilities: ActionProbabilities,
    pub modifier: QuestionModifier,
    /// On-target probability of a shot from a distance slot
    pub distance_on_target: f64,
    /// Probability that an on-target shot is saved
    pub keeper_save: f64,
    /// Chance the away attacker on its distance slot dribbles instead of shooting
    pub opponent_distance_dribble: f64,
    pub max_actions: u32,
    /// Overrides the session's max score when set
    pub max_score: Option<u32>,
    /// Use the session's action hint as the action cap
    pub enforce_duration_hint: bool,
    pub timings: Timings,
    pub seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            probabilities: ActionProbabilities::default(),
            modifier: QuestionModifier::default(),
            distance_on_target: 0.30,
            keeper_save: 0.50,
            opponent_distance_dribble: 0.70,
            max_actions: 100,
            max_score: None,
            enforce_duration_hint: false,
            timings: Timings::default(),
            seed: None,
        }
    }
}

impl MatchConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: MatchConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.probabilities.validate()?;
        let fixed = [
            ("distance_on_target", self.distance_on_target),
            ("keeper_save", self.keeper_save),
            ("opponent_distance_dribble", self.opponent_distance_dribble),
            ("correct_bonus", self.modifier.correct_bonus),
            ("wrong_penalty", self.modifier.wrong_penalty),
        ];
        for (name, value) in fixed {
            if !(0.0..=1.0).contains(&value) {
                return Err(QuizballError::InvalidConfig(format!(
                    "{name} must be within 0.0..=1.0, got {value}"
                )));
            }
        }
        if self.max_actions == 0 {
            return Err(QuizballError::InvalidConfig(
                "max_actions must be positive".to_string(),
            ));
        }
        if self.max_score == Some(0) {
            return Err(QuizballError::InvalidConfig(
                "max_score must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_score(mut self, max_score: u32) -> Self {
        self.max_score = Some(max_score);
        self
    }

    pub fn with_max_actions(mut self, max_actions: u32) -> Self {
        self.max_actions = max_actions;
        self
    }
}

/// Match length preset; only affects the action hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Tiny,
    Short,
    #[default]
    Regular,
    Long,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Tiny,
        Difficulty::Short,
        Difficulty::Regular,
        Difficulty::Long,
    ];

    /// Inclusive `[min, max]` range of the action hint
    pub fn action_range(self) -> (u32, u32) {
        match self {
            Difficulty::Tiny => (10, 15),
            Difficulty::Short => (40, 50),
            Difficulty::Regular => (60, 90),
            Difficulty::Long => (100, 120),
        }
    }

    /// Draw an action hint uniformly from the range
    pub fn draw_action_hint(self, rng: &mut dyn RandomSource) -> u32 {
        let (min, max) = self.action_range();
        min + rng.pick_index((max - min + 1) as usize) as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Tiny => "tiny",
            Difficulty::Short => "short",
            Difficulty::Regular => "regular",
            Difficulty::Long => "long",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiny" => Ok(Difficulty::Tiny),
            "short" => Ok(Difficulty::Short),
            "regular" => Ok(Difficulty::Regular),
            "long" => Ok(Difficulty::Long),
            _ => Err(format!(
                "invalid difficulty '{s}' (expected: tiny, short, regular, long)"
            )),
        }
    }
}

/// Languages questions may be asked in
pub const LANGUAGES: [&str; 3] = ["en", "de", "el"];

/// The only state persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub language: String,
    pub categories: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            language: "en".to_string(),
            categories: Vec::new(),
        }
    }
}

impl Preferences {
    /// Load saved preferences; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no preferences at {}, using defaults", path.display());
            return Ok(Preferences::default());
        }
        let content = fs::read_to_string(path)?;
        let mut prefs: Preferences = serde_json::from_str(&content)?;
        if !LANGUAGES.contains(&prefs.language.as_str()) {
            log::warn!("ignoring unknown saved language '{}'", prefs.language);
            prefs.language = Preferences::default().language;
        }
        Ok(prefs)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns false for languages without questions
    pub fn set_language(&mut self, code: &str) -> bool {
        if LANGUAGES.contains(&code) {
            self.language = code.to_string();
            true
        } else {
            false
        }
    }

    /// Add the category if absent, remove it otherwise
    pub fn toggle_category(&mut self, category: &str) {
        if let Some(pos) = self.categories.iter().position(|c| c == category) {
            self.categories.remove(pos);
        } else {
            self.categories.push(category.to_string());
        }
    }

    pub fn select_all(&mut self, available: &[String]) {
        self.categories = available.to_vec();
    }

    /// Drop selections no longer offered; an empty result selects everything
    pub fn reconcile(&mut self, available: &[String]) {
        self.categories.retain(|c| available.contains(c));
        if self.categories.is_empty() {
            self.select_all(available);
        }
    }
}
