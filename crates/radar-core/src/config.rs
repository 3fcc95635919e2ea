//! Target names, timing defaults and plausibility thresholds

use serde::{Deserialize, Serialize};

/// Target process
pub mod process {
    /// Executable file name of the game
    pub const NAME: &str = "cs2";
}

/// Shared libraries the resolver needs
pub mod library {
    pub const CLIENT: &str = "libclient.so";
    pub const ENGINE: &str = "libengine2.so";
    pub const TIER0: &str = "libtier0.so";
}

/// Registered interface and console variable names
pub mod registry {
    /// Looked up in the engine library
    pub const RESOURCE_SERVICE: &str = "GameResourceServiceClientV0";
    /// Looked up in the tier0 library
    pub const CVAR_SYSTEM: &str = "VEngineCvar0";

    pub const TEAMMATES_ARE_ENEMIES: &str = "mp_teammates_are_enemies";
    pub const CROSSHAIR_ALPHA: &str = "cl_crosshairalpha";
}

/// Polling and retry intervals
pub mod timing {
    use std::time::Duration;

    /// Interval between two sweeps
    pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);
    /// Delay before retrying attach or resolution
    pub const ATTACH_RETRY_DELAY: Duration = Duration::from_secs(2);
}

/// Heuristic guards against reading half-built or unrelated objects.
///
/// None of these are protocol invariants; they only decide which values are
/// believable enough to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plausibility {
    pub min_health: i32,
    pub max_health: i32,
    pub min_armor: i32,
    pub max_armor: i32,
    /// Money values above this are reported as 0; `None` disables the check
    pub max_money: Option<i32>,
    /// Harvested armor offsets outside `1..=armor_offset_max` are rejected
    pub armor_offset_max: i32,
    /// Longest weapon inventory read per pawn
    pub max_weapons: u64,
}

impl Default for Plausibility {
    fn default() -> Self {
        Self {
            min_health: 0,
            max_health: 100,
            min_armor: 0,
            max_armor: 100,
            max_money: None,
            armor_offset_max: 20000,
            max_weapons: 64,
        }
    }
}

impl Plausibility {
    /// Values outside `[min, max]` are reported as 0.
    pub fn clamp(value: i32, min: i32, max: i32) -> i32 {
        if (min..=max).contains(&value) { value } else { 0 }
    }

    pub fn health(&self, value: i32) -> i32 {
        Self::clamp(value, self.min_health, self.max_health)
    }

    pub fn armor(&self, value: i32) -> i32 {
        Self::clamp(value, self.min_armor, self.max_armor)
    }

    pub fn money(&self, value: i32) -> i32 {
        match self.max_money {
            Some(max) => Self::clamp(value, 0, max),
            None => value,
        }
    }

    pub fn armor_offset(&self, offset: i32) -> bool {
        offset > 0 && offset <= self.armor_offset_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamp() {
        let p = Plausibility::default();
        let clamped: Vec<i32> = [-5, 0, 47, 100, 150].iter().map(|&v| p.health(v)).collect();
        assert_eq!(clamped, vec![0, 0, 47, 100, 0]);
    }

    #[test]
    fn test_armor_clamp_follows_same_law() {
        let p = Plausibility::default();
        let clamped: Vec<i32> = [-5, 0, 47, 100, 150].iter().map(|&v| p.armor(v)).collect();
        assert_eq!(clamped, vec![0, 0, 47, 100, 0]);
    }

    #[test]
    fn test_money_ceiling_is_optional() {
        let mut p = Plausibility::default();
        assert_eq!(p.money(65000), 65000);
        p.max_money = Some(16000);
        assert_eq!(p.money(65000), 0);
        assert_eq!(p.money(800), 800);
    }

    #[test]
    fn test_armor_offset_bounds() {
        let p = Plausibility::default();
        assert!(!p.armor_offset(0));
        assert!(!p.armor_offset(-8));
        assert!(p.armor_offset(0x1A0C));
        assert!(p.armor_offset(20000));
        assert!(!p.armor_offset(20001));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let p: Plausibility = serde_json::from_str(r#"{"max_health": 120}"#).unwrap();
        assert_eq!(p.max_health, 120);
        assert_eq!(p.max_armor, 100);
        assert_eq!(p.armor_offset_max, 20000);
    }
}
