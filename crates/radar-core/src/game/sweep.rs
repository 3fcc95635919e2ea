//! Per-tick player sweep
//!
//! Every read here is best effort. A missing pointer degrades the one field
//! it feeds (zero, `"unknown"`, or an empty list) and never aborts the sweep.

use tracing::{debug, warn};

use crate::config::Plausibility;
use crate::game::entity::{local_controller, observed_target, resolve_handle, resolve_pawn};
use crate::game::{LifeState, PlayerSnapshot, Team, Vec3};
use crate::memory::ReadMemory;
use crate::memory::layout::{angles, convar, entity, strings, vec3, weapon};
use crate::offset::ResolvedOffsets;

pub const UNKNOWN_WEAPON: &str = "unknown";
pub const UNKNOWN_NAME: &str = "?";

/// Field readers bound to one process and one resolved snapshot
pub struct Sweeper<'a, R: ReadMemory> {
    reader: &'a R,
    offsets: &'a ResolvedOffsets,
    plausibility: &'a Plausibility,
}

impl<'a, R: ReadMemory> Sweeper<'a, R> {
    pub fn new(
        reader: &'a R,
        offsets: &'a ResolvedOffsets,
        plausibility: &'a Plausibility,
    ) -> Self {
        Self {
            reader,
            offsets,
            plausibility,
        }
    }

    fn read_pointer(&self, address: u64) -> Option<u64> {
        self.reader
            .read_u64(address)
            .ok()
            .filter(|&pointer| pointer != 0)
    }

    pub fn name(&self, controller: u64) -> String {
        self.read_pointer(controller.wrapping_add(self.offsets.controller.name))
            .and_then(|pointer| {
                self.reader
                    .read_c_string(pointer, strings::PLAYER_NAME_MAX)
                    .ok()
            })
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    pub fn health(&self, pawn: u64) -> i32 {
        let raw = self
            .reader
            .read_i32(pawn.wrapping_add(self.offsets.pawn.health))
            .unwrap_or_default();
        self.plausibility.health(raw)
    }

    pub fn armor(&self, pawn: u64) -> i32 {
        let raw = self
            .reader
            .read_i32(pawn.wrapping_add(self.offsets.pawn.armor))
            .unwrap_or_default();
        self.plausibility.armor(raw)
    }

    pub fn money(&self, controller: u64) -> i32 {
        let Some(services) =
            self.read_pointer(controller.wrapping_add(self.offsets.controller.money_services))
        else {
            return 0;
        };
        let raw = self
            .reader
            .read_i32(services.wrapping_add(self.offsets.money_service.money))
            .unwrap_or_default();
        self.plausibility.money(raw)
    }

    pub fn team(&self, pawn: u64) -> Team {
        Team::from_u8(
            self.reader
                .read_u8(pawn.wrapping_add(self.offsets.pawn.team))
                .unwrap_or_default(),
        )
    }

    pub fn life_state(&self, pawn: u64) -> LifeState {
        LifeState::from_u8(
            self.reader
                .read_u8(pawn.wrapping_add(self.offsets.pawn.life_state))
                .unwrap_or_default(),
        )
    }

    /// Designer name of a weapon entity: instance → identity → name.
    pub fn weapon_name(&self, instance: u64) -> String {
        self.read_pointer(instance.wrapping_add(weapon::IDENTITY))
            .and_then(|identity| self.read_pointer(identity.wrapping_add(weapon::DESIGNER_NAME)))
            .and_then(|name| {
                self.reader
                    .read_c_string(name, strings::WEAPON_NAME_MAX)
                    .ok()
            })
            .unwrap_or_else(|| UNKNOWN_WEAPON.to_string())
    }

    pub fn weapon(&self, pawn: u64) -> String {
        match self.read_pointer(pawn.wrapping_add(self.offsets.pawn.weapon)) {
            Some(instance) => self.weapon_name(instance),
            None => UNKNOWN_WEAPON.to_string(),
        }
    }

    /// Names of every weapon in the pawn's inventory.
    ///
    /// The inventory is a length followed by a pointer to 32-bit handles,
    /// which only carry 12 index bits and resolve through the entity table.
    pub fn weapons(&self, pawn: u64) -> Vec<String> {
        let Some(services) = self.read_pointer(pawn.wrapping_add(self.offsets.pawn.weapon_services))
        else {
            return Vec::new();
        };
        let vector = services.wrapping_add(self.offsets.weapon_service.my_weapons);
        let length = self.reader.read_u64(vector).unwrap_or_default();
        if length > self.plausibility.max_weapons {
            debug!("Ignoring implausible weapon count {} at 0x{:X}", length, vector);
            return Vec::new();
        }
        let Some(data) = self.read_pointer(vector.wrapping_add(weapon::VECTOR_DATA)) else {
            return Vec::new();
        };

        (0..length)
            .filter_map(|i| {
                self.reader
                    .read_u32(data.wrapping_add(i * weapon::HANDLE_SIZE))
                    .ok()
            })
            .filter_map(|handle| {
                resolve_handle(self.reader, self.offsets, handle & entity::WEAPON_INDEX_MASK).ok()
            })
            .map(|instance| self.weapon_name(instance))
            .collect()
    }

    pub fn total_hits(&self, pawn: u64) -> i32 {
        match self.read_pointer(pawn.wrapping_add(self.offsets.pawn.bullet_services)) {
            Some(services) => self
                .reader
                .read_i32(services.wrapping_add(self.offsets.bullet_service.total_hits))
                .unwrap_or_default(),
            None => 0,
        }
    }

    pub fn color(&self, controller: u64) -> i32 {
        self.reader
            .read_i32(controller.wrapping_add(self.offsets.controller.color))
            .unwrap_or_default()
    }

    pub fn position(&self, pawn: u64) -> Vec3 {
        let origin = pawn.wrapping_add(self.offsets.pawn.position);
        Vec3 {
            x: self.reader.read_f32(origin.wrapping_add(vec3::X)).unwrap_or_default(),
            y: self.reader.read_f32(origin.wrapping_add(vec3::Y)).unwrap_or_default(),
            z: self.reader.read_f32(origin.wrapping_add(vec3::Z)).unwrap_or_default(),
        }
    }

    // Optional fields below read nothing when their offset stayed unresolved

    /// Eye yaw in degrees.
    pub fn rotation(&self, pawn: u64) -> f32 {
        match self.offsets.pawn.eye_angles {
            0 => 0.0,
            offset => self
                .reader
                .read_f32(pawn.wrapping_add(offset).wrapping_add(angles::YAW))
                .unwrap_or_default(),
        }
    }

    pub fn ping(&self, controller: u64) -> i32 {
        match self.offsets.controller.ping {
            0 => 0,
            offset => self
                .reader
                .read_i32(controller.wrapping_add(offset))
                .unwrap_or_default(),
        }
    }

    pub fn steam_id(&self, controller: u64) -> u64 {
        match self.offsets.controller.steam_id {
            0 => 0,
            offset => self
                .reader
                .read_u64(controller.wrapping_add(offset))
                .unwrap_or_default(),
        }
    }

    /// A flag byte inside the pawn's item services; false without services.
    fn item_flag(&self, pawn: u64, flag: u64) -> bool {
        if self.offsets.pawn.item_services == 0 || flag == 0 {
            return false;
        }
        self.read_pointer(pawn.wrapping_add(self.offsets.pawn.item_services))
            .and_then(|services| self.reader.read_u8(services.wrapping_add(flag)).ok())
            .is_some_and(|value| value != 0)
    }

    pub fn has_defuser(&self, pawn: u64) -> bool {
        self.item_flag(pawn, self.offsets.item_service.has_defuser)
    }

    pub fn has_helmet(&self, pawn: u64) -> bool {
        self.item_flag(pawn, self.offsets.item_service.has_helmet)
    }

    pub fn snapshot(&self, controller: u64, pawn: u64, active_player: bool) -> PlayerSnapshot {
        PlayerSnapshot {
            name: self.name(controller),
            health: self.health(pawn),
            armor: self.armor(pawn),
            money: self.money(controller),
            team: self.team(pawn),
            life_state: self.life_state(pawn),
            weapon: self.weapon(pawn),
            weapons: self.weapons(pawn),
            total_hits: self.total_hits(pawn),
            color: self.color(controller),
            position: self.position(pawn),
            rotation: self.rotation(pawn),
            ping: self.ping(controller),
            steam_id: self.steam_id(controller),
            has_defuser: self.has_defuser(pawn),
            has_helmet: self.has_helmet(pawn),
            active_player,
        }
    }

    /// Every playing controller, with the local player last.
    ///
    /// Returns nothing if the local controller or its pawn cannot be found.
    pub fn sweep(&self) -> Vec<PlayerSnapshot> {
        if !self.offsets.is_complete() {
            warn!("Sweep skipped, offsets are incomplete");
            return Vec::new();
        }

        let Ok(local) = local_controller(self.reader, self.offsets) else {
            debug!("No local controller");
            return Vec::new();
        };
        let Ok(local_pawn) = resolve_pawn(self.reader, self.offsets, local) else {
            debug!("Local controller 0x{:X} has no pawn", local);
            return Vec::new();
        };
        let observed = observed_target(self.reader, self.offsets, local_pawn);

        let mut players = Vec::new();
        for index in 1..=entity::MAX_CONTROLLERS {
            let Ok(controller) = resolve_handle(self.reader, self.offsets, index) else {
                continue;
            };
            if controller == local {
                continue;
            }
            let Ok(pawn) = resolve_pawn(self.reader, self.offsets, controller) else {
                continue;
            };
            if !self.team(pawn).is_playing() {
                continue;
            }

            players.push(self.snapshot(controller, pawn, observed == Some(pawn)));
        }

        let local_player = self.snapshot(local, local_pawn, observed.is_none());
        if local_player.team.is_playing() {
            players.push(local_player);
        }
        players
    }
}

/// Read every player for one tick.
pub fn sweep<R: ReadMemory>(
    reader: &R,
    offsets: &ResolvedOffsets,
    plausibility: &Plausibility,
) -> Vec<PlayerSnapshot> {
    Sweeper::new(reader, offsets, plausibility).sweep()
}

/// Whether `mp_teammates_are_enemies` is set.
pub fn is_free_for_all<R: ReadMemory>(reader: &R, offsets: &ResolvedOffsets) -> bool {
    reader
        .read_i32(offsets.convars.teammates_are_enemies.wrapping_add(convar::VALUE))
        .is_ok_and(|value| value != 0)
}
