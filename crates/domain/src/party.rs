//! Party member entity and progression rules.
//!
//! A party member is a character actively joined to one game, carrying
//! combat/progression state (HP, MP, XP, level, status effects) distinct
//! from the character's base definition.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::ids::{CharacterId, GameId, PartyMemberId};

/// Maximum length for name fields
const MAX_NAME_LENGTH: usize = 200;

/// HP granted to current and maximum per level gained.
pub const LEVEL_UP_HP_BONUS: i64 = 10;

/// MP granted to current and maximum per level gained.
pub const LEVEL_UP_MP_BONUS: i64 = 5;

/// Level as a pure function of accumulated experience.
///
/// Square-law curve: `floor(sqrt(xp / 100)) + 1`, so 0 XP is level 1,
/// 100 XP level 2, 400 XP level 3, 900 XP level 4. Negative totals are
/// treated as zero.
pub fn level_for_xp(xp: i64) -> u32 {
    let xp = xp.max(0) as f64;
    (xp / 100.0).sqrt().floor() as u32 + 1
}

// ============================================================================
// CharacterName
// ============================================================================

/// A validated character display name (non-empty, <=200 chars, trimmed).
///
/// The display name doubles as the lookup key the narrator uses when it
/// targets a character in a control payload, so it is normalized here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CharacterName(String);

impl CharacterName {
    /// Create a new validated character name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is empty after
    /// trimming or exceeds 200 characters.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Character name cannot be empty"));
        }
        if trimmed.len() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Character name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CharacterName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CharacterName> for String {
    fn from(name: CharacterName) -> String {
        name.0
    }
}

// ============================================================================
// StatusEffects
// ============================================================================

/// An order-insensitive set of status-effect labels.
///
/// Backed by a `Vec` to keep insertion order stable for display, with set
/// semantics enforced on mutation: `add` of a present label and `remove`
/// of an absent label are both no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StatusEffects(Vec<String>);

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw labels, dropping duplicates and blanks.
    ///
    /// Malformed persisted data degrades to an empty or partial set
    /// rather than an error.
    pub fn from_labels(labels: impl IntoIterator<Item = String>) -> Self {
        let mut effects = Self::new();
        for label in labels {
            effects.add(&label);
        }
        effects
    }

    /// Adds a label if not already present. Returns true if it was added.
    pub fn add(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.contains(label) {
            return false;
        }
        self.0.push(label.to_string());
        true
    }

    /// Removes a label if present. Removing an absent label is a no-op.
    pub fn remove(&mut self, label: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|e| e != label);
        self.0.len() != before
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|e| e == label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for StatusEffects {
    /// Persisted data goes through the same dedup/blank filtering as
    /// labels built in code, so a stored duplicate cannot resurrect.
    fn from(labels: Vec<String>) -> Self {
        Self::from_labels(labels)
    }
}

impl From<StatusEffects> for Vec<String> {
    fn from(effects: StatusEffects) -> Self {
        effects.0
    }
}

// ============================================================================
// PartyMember
// ============================================================================

/// A character's in-game state: combat resources, progression, and active
/// status effects.
///
/// Mutated only by the state mutation engine (narrator control payloads)
/// or explicit item-use actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyMember {
    id: PartyMemberId,
    game_id: GameId,
    character_id: CharacterId,
    name: CharacterName,
    class_name: String,
    /// Serialized ability stats, opaque to the engine (prompt context only).
    stats: String,
    hp: i64,
    max_hp: i64,
    mp: i64,
    max_mp: i64,
    xp: i64,
    level: u32,
    status_effects: StatusEffects,
}

impl PartyMember {
    pub fn new(
        game_id: GameId,
        character_id: CharacterId,
        name: CharacterName,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            id: PartyMemberId::new(),
            game_id,
            character_id,
            name,
            class_name: class_name.into(),
            stats: String::new(),
            hp: 20,
            max_hp: 20,
            mp: 10,
            max_mp: 10,
            xp: 0,
            level: 1,
            status_effects: StatusEffects::new(),
        }
    }

    pub fn with_id(mut self, id: PartyMemberId) -> Self {
        self.id = id;
        self
    }

    pub fn with_stats(mut self, stats: impl Into<String>) -> Self {
        self.stats = stats.into();
        self
    }

    pub fn with_hp(mut self, hp: i64, max_hp: i64) -> Self {
        self.hp = hp;
        self.max_hp = max_hp;
        self
    }

    pub fn with_mp(mut self, mp: i64, max_mp: i64) -> Self {
        self.mp = mp;
        self.max_mp = max_mp;
        self
    }

    pub fn with_xp(mut self, xp: i64) -> Self {
        self.xp = xp;
        self.level = level_for_xp(xp).max(self.level);
        self
    }

    pub fn with_status_effects(mut self, effects: StatusEffects) -> Self {
        self.status_effects = effects;
        self
    }

    pub fn id(&self) -> PartyMemberId {
        self.id
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn character_id(&self) -> CharacterId {
        self.character_id
    }

    pub fn name(&self) -> &CharacterName {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn stats(&self) -> &str {
        &self.stats
    }

    pub fn hp(&self) -> i64 {
        self.hp
    }

    pub fn max_hp(&self) -> i64 {
        self.max_hp
    }

    pub fn mp(&self) -> i64 {
        self.mp
    }

    pub fn max_mp(&self) -> i64 {
        self.max_mp
    }

    pub fn xp(&self) -> i64 {
        self.xp
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn status_effects(&self) -> &StatusEffects {
        &self.status_effects
    }

    /// Increment current and maximum HP. Saturating: payload deltas are
    /// untrusted and must never overflow.
    ///
    /// No clamping here: callers clamp once after all deltas are summed
    /// (see [`Self::clamp_to_maxima`]).
    pub fn adjust_hp(&mut self, delta: i64, max_delta: i64) {
        self.hp = self.hp.saturating_add(delta);
        self.max_hp = self.max_hp.saturating_add(max_delta);
    }

    /// Increment current and maximum MP.
    pub fn adjust_mp(&mut self, delta: i64, max_delta: i64) {
        self.mp = self.mp.saturating_add(delta);
        self.max_mp = self.max_mp.saturating_add(max_delta);
    }

    /// Accumulate experience.
    pub fn add_xp(&mut self, delta: i64) {
        self.xp = self.xp.saturating_add(delta);
    }

    /// Clamp current HP/MP down to their maxima. Never raises a value
    /// and never floors at zero.
    pub fn clamp_to_maxima(&mut self) {
        self.hp = self.hp.min(self.max_hp);
        self.mp = self.mp.min(self.max_mp);
    }

    /// Raise the level. Level is monotonic: a lower value is ignored.
    pub fn raise_level(&mut self, level: u32) {
        self.level = self.level.max(level);
    }

    /// Replace the status-effect set.
    pub fn set_status_effects(&mut self, effects: StatusEffects) {
        self.status_effects = effects;
    }
}
