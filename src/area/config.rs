use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the startup system looks for the passability table.
pub const PASSABILITY_CONFIG_PATH: &str = "assets/pathfind.ron";

/// Built-in class flags: 0 = blocked, 1 = walkable, 2 = special.
const DEFAULT_CLASS_FLAGS: [u8; 16] = [0, 1, 1, 1, 1, 1, 1, 1, 0, 1, 0, 0, 0, 0, 2, 1];
const DEFAULT_BASE_STEP_COST: u32 = 10;
const DEFAULT_EXTRA_ORTHOGONAL_COST: u32 = 4;

/// Movement status of one terrain class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Passability {
    Blocked,
    Walkable,
    /// Passable, but flagged for special handling by movement code.
    Special,
}

impl Passability {
    /// Decode a raw table flag. Anything above 1 counts as special.
    pub fn from_flag(flag: u8) -> Self {
        match flag {
            0 => Passability::Blocked,
            1 => Passability::Walkable,
            _ => Passability::Special,
        }
    }

    #[inline]
    pub fn is_passable(self) -> bool {
        self != Passability::Blocked
    }
}

/// Immutable passability settings shared by every pathfinder of a game.
///
/// Built once at startup (see [`PassabilityConfig::load`]) and handed to
/// [`PathFinder::new`](crate::area::PathFinder::new). Tests construct their own
/// instances instead of touching any global.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassabilityConfig {
    pub classes: [Passability; 16],
    /// Cost of a diagonal expansion step.
    pub base_step_cost: u32,
    /// Added on top of the base cost for orthogonal steps.
    pub extra_orthogonal_cost: u32,
}

impl Default for PassabilityConfig {
    fn default() -> Self {
        Self {
            classes: DEFAULT_CLASS_FLAGS.map(Passability::from_flag),
            base_step_cost: DEFAULT_BASE_STEP_COST,
            extra_orthogonal_cost: DEFAULT_EXTRA_ORTHOGONAL_COST,
        }
    }
}

impl PassabilityConfig {
    /// Status of a terrain class. Only the low four bits are significant.
    #[inline]
    pub fn passability(&self, class: u8) -> Passability {
        self.classes[(class & 0x0f) as usize]
    }

    #[inline]
    pub fn is_passable(&self, class: u8) -> bool {
        self.passability(class).is_passable()
    }

    /// Parse a RON passability table and apply it over the built-in defaults.
    pub fn from_ron_str(contents: &str) -> Result<Self, ron::error::SpannedError> {
        let table: PassabilityTable = ron::from_str(contents)?;
        Ok(table.apply(Self::default()))
    }

    /// Load the passability table from disk.
    ///
    /// A missing or malformed file is not fatal: the error is logged and the
    /// built-in defaults are returned unchanged.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_ron_str(&contents) {
                Ok(config) => {
                    info!("Loaded passability config from {}", path.display());
                    config
                }
                Err(e) => {
                    error!("Failed to parse passability config {}: {}", path.display(), e);
                    error!("Using default PassabilityConfig");
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                error!("Using default PassabilityConfig");
                Self::default()
            }
        }
    }
}

/// On-disk override table.
///
/// Every field is optional; `None` (or leaving the field out) keeps the
/// built-in value.
///
/// ```ron
/// (
///     classes: [None, None, None, None, None, None, None, None,
///               Some(1), None, None, None, None, None, None, None],
///     base_step_cost: Some(12),
/// )
/// ```
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PassabilityTable {
    /// Per-class flag overrides, indexed by class. Entries past 16 are ignored.
    pub classes: Vec<Option<u8>>,
    pub base_step_cost: Option<u32>,
    pub extra_orthogonal_cost: Option<u32>,
}

impl PassabilityTable {
    pub fn apply(&self, mut config: PassabilityConfig) -> PassabilityConfig {
        if self.classes.len() > config.classes.len() {
            warn!(
                "Passability table lists {} classes, only the first {} are used",
                self.classes.len(),
                config.classes.len()
            );
        }
        for (slot, flag) in config.classes.iter_mut().zip(self.classes.iter()) {
            if let Some(flag) = flag {
                *slot = Passability::from_flag(*flag);
            }
        }
        if let Some(cost) = self.base_step_cost {
            // A zero base cost would stall backtracing on a flat cost field.
            if cost == 0 {
                warn!("base_step_cost of 0 is not usable, clamping to 1");
            }
            config.base_step_cost = cost.max(1);
        }
        if let Some(cost) = self.extra_orthogonal_cost {
            config.extra_orthogonal_cost = cost;
        }
        config
    }
}

/// Insert the passability config at startup unless the app already provides one.
pub(crate) fn load_passability_config(
    mut commands: Commands,
    existing: Option<Res<PassabilityConfig>>,
) {
    if existing.is_some() {
        debug!("PassabilityConfig supplied by the app, not reading {}", PASSABILITY_CONFIG_PATH);
        return;
    }
    commands.insert_resource(PassabilityConfig::load(PASSABILITY_CONFIG_PATH));
}
