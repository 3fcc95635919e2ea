use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromRepr,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum Team {
    #[default]
    #[strum(serialize = "none")]
    None = 0,
    #[strum(serialize = "spectator")]
    Spectator = 1,
    #[strum(serialize = "T")]
    T = 2,
    #[strum(serialize = "CT")]
    CT = 3,
}

impl Team {
    /// Unknown team numbers are treated as unassigned.
    pub fn from_u8(value: u8) -> Self {
        Self::from_repr(value).unwrap_or_default()
    }

    /// Terrorists and counter-terrorists; spectators and unassigned players
    /// are not reported.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::T | Self::CT)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromRepr,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum LifeState {
    #[strum(serialize = "alive")]
    Alive = 0,
    #[strum(serialize = "dying")]
    Dying = 1,
    #[strum(serialize = "dead")]
    Dead = 2,
    #[strum(serialize = "unknown")]
    Unknown = 0xFF,
}

impl LifeState {
    pub fn from_u8(value: u8) -> Self {
        Self::from_repr(value).unwrap_or(Self::Unknown)
    }

    pub fn is_alive(&self) -> bool {
        *self == Self::Alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_from_u8() {
        assert_eq!(Team::from_u8(0), Team::None);
        assert_eq!(Team::from_u8(1), Team::Spectator);
        assert_eq!(Team::from_u8(2), Team::T);
        assert_eq!(Team::from_u8(3), Team::CT);
        assert_eq!(Team::from_u8(9), Team::None);
    }

    #[test]
    fn test_only_t_and_ct_are_playing() {
        assert!(Team::T.is_playing());
        assert!(Team::CT.is_playing());
        assert!(!Team::Spectator.is_playing());
        assert!(!Team::None.is_playing());
    }

    #[test]
    fn test_life_state() {
        assert!(LifeState::from_u8(0).is_alive());
        assert_eq!(LifeState::from_u8(2), LifeState::Dead);
        assert!(!LifeState::from_u8(2).is_alive());
        assert_eq!(LifeState::from_u8(7), LifeState::Unknown);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Team::CT.to_string(), "CT");
        assert_eq!("T".parse::<Team>().unwrap(), Team::T);
        assert_eq!(LifeState::Dying.to_string(), "dying");
    }
}
