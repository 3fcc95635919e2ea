use serde::{Deserialize, Serialize};

use crate::game::{LifeState, Team};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One player as seen during a single sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub health: i32,
    pub armor: i32,
    pub money: i32,
    pub team: Team,
    pub life_state: LifeState,
    /// Designer name of the held weapon, `"unknown"` if it cannot be read
    pub weapon: String,
    /// Every weapon in the inventory
    pub weapons: Vec<String>,
    pub total_hits: i32,
    /// Competitive teammate color index
    pub color: i32,
    pub position: Vec3,
    /// Eye yaw in degrees, 0 when the field was not resolved
    pub rotation: f32,
    pub ping: i32,
    pub steam_id: u64,
    pub has_defuser: bool,
    pub has_helmet: bool,
    /// The local player, or the player the local player is spectating
    pub active_player: bool,
}

impl PlayerSnapshot {
    pub fn is_alive(&self) -> bool {
        self.life_state.is_alive()
    }
}
