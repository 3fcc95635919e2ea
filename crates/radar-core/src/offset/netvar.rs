//! Netvar offset harvesting from a client module dump
//!
//! The client's static data embeds field descriptors for every networked
//! class member. A descriptor starts with a pointer to the member name, or,
//! for members carrying the `MNetworkEnable` annotation, with a pointer to a
//! pointer to that annotation string followed by the member name pointer.
//! The field's byte offset sits at a fixed delta after the name pointer.
//!
//! Descriptors are found by scanning the dump backwards on 8-byte strides and
//! keeping the first plausible match for every tracked field name. A few
//! tracked fields are optional: they are collected when present but never
//! make a pass fail.

use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::debug;

use crate::config::Plausibility;
use crate::elf::ModuleImage;
use crate::error::{Error, Result};
use crate::memory::{dump_c_str, dump_i32, dump_u64};
use crate::offset::ResolvedOffsets;

/// Annotation string marking a network-enabled descriptor
pub const NETWORK_ENABLE: &str = "MNetworkEnable";

/// Tracked class members, named exactly as the game registers them
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    IntoStaticStr,
    Display,
    EnumIter,
    EnumCount,
)]
#[repr(u8)]
pub enum Netvar {
    #[strum(serialize = "m_hPawn")]
    Pawn,
    #[strum(serialize = "m_sSanitizedPlayerName")]
    SanitizedPlayerName,
    #[strum(serialize = "m_iCompTeammateColor")]
    CompTeammateColor,
    #[strum(serialize = "m_pInGameMoneyServices")]
    InGameMoneyServices,
    #[strum(serialize = "m_iHealth")]
    Health,
    #[strum(serialize = "m_ArmorValue")]
    ArmorValue,
    #[strum(serialize = "m_iTeamNum")]
    TeamNum,
    #[strum(serialize = "m_lifeState")]
    LifeState,
    #[strum(serialize = "m_pClippingWeapon")]
    ClippingWeapon,
    #[strum(serialize = "m_pBulletServices")]
    BulletServices,
    #[strum(serialize = "m_pWeaponServices")]
    WeaponServices,
    #[strum(serialize = "m_vOldOrigin")]
    OldOrigin,
    #[strum(serialize = "m_pObserverServices")]
    ObserverServices,
    #[strum(serialize = "m_iAccount")]
    Account,
    #[strum(serialize = "m_totalHitsOnServer")]
    TotalHitsOnServer,
    #[strum(serialize = "m_hMyWeapons")]
    MyWeapons,
    #[strum(serialize = "m_hActiveWeapon")]
    ActiveWeapon,
    #[strum(serialize = "m_hObserverTarget")]
    ObserverTarget,
    #[strum(serialize = "m_iPing")]
    Ping,
    #[strum(serialize = "m_steamID")]
    SteamId,
    #[strum(serialize = "m_angEyeAngles")]
    EyeAngles,
    #[strum(serialize = "m_pItemServices")]
    ItemServices,
    #[strum(serialize = "m_bHasDefuser")]
    HasDefuser,
    #[strum(serialize = "m_bHasHelmet")]
    HasHelmet,
}

impl Netvar {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Whether a pass without this field fails.
    pub fn is_required(&self) -> bool {
        !matches!(
            self,
            Self::Ping
                | Self::SteamId
                | Self::EyeAngles
                | Self::ItemServices
                | Self::HasDefuser
                | Self::HasHelmet
        )
    }

    /// Only descriptors carrying `MNetworkEnable` are accepted for this field.
    pub fn requires_network_enable(&self) -> bool {
        matches!(
            self,
            Self::Pawn
                | Self::SanitizedPlayerName
                | Self::Health
                | Self::TeamNum
                | Self::LifeState
                | Self::ActiveWeapon
                | Self::Ping
                | Self::SteamId
                | Self::HasHelmet
        )
    }

    /// Distance from the descriptor start to the 32-bit field offset.
    pub fn offset_delta(&self) -> usize {
        match self {
            Self::Pawn
            | Self::SanitizedPlayerName
            | Self::Health
            | Self::ArmorValue
            | Self::TeamNum
            | Self::LifeState
            | Self::ActiveWeapon
            | Self::Ping
            | Self::SteamId
            | Self::HasHelmet => 0x18,
            Self::CompTeammateColor
            | Self::InGameMoneyServices
            | Self::ClippingWeapon
            | Self::Account
            | Self::EyeAngles
            | Self::HasDefuser => 0x10,
            Self::BulletServices
            | Self::WeaponServices
            | Self::OldOrigin
            | Self::ObserverServices
            | Self::TotalHitsOnServer
            | Self::MyWeapons
            | Self::ObserverTarget
            | Self::ItemServices => 0x08,
        }
    }
}

/// Whether the descriptor at `entry` is annotated with `MNetworkEnable`.
///
/// The first 8 bytes must point inside the image, at another pointer that
/// also lies inside the image and names the annotation string.
pub fn classify(dump: &[u8], entry: usize, image: &ModuleImage) -> bool {
    let Some(first) = dump_u64(dump, entry) else {
        return false;
    };
    if first == 0 || !image.contains(first) {
        return false;
    }

    let Some(second) = dump_u64(dump, (first - image.base) as usize) else {
        return false;
    };
    if !image.contains(second) {
        return false;
    }

    dump_c_str(dump, (second - image.base) as usize) == Some(NETWORK_ENABLE.as_bytes())
}

/// One optional slot per tracked field; the first accepted value sticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetvarOffsets {
    slots: [Option<u64>; Netvar::COUNT],
}

impl NetvarOffsets {
    pub fn get(&self, field: Netvar) -> Option<u64> {
        self.slots[field as usize]
    }

    /// Record `offset` unless the field already has one.
    pub fn record(&mut self, field: Netvar, offset: u64) -> bool {
        let slot = &mut self.slots[field as usize];
        if slot.is_some() {
            return false;
        }
        *slot = Some(offset);
        true
    }

    /// Every required field has an offset.
    pub fn is_complete(&self) -> bool {
        Netvar::iter()
            .filter(Netvar::is_required)
            .all(|field| self.get(field).is_some())
    }

    /// Every tracked field, optional ones included, has an offset.
    pub fn all_found(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Required fields without an offset.
    pub fn missing(&self) -> Vec<&'static str> {
        Netvar::iter()
            .filter(|field| field.is_required() && self.get(*field).is_none())
            .map(|field| field.name())
            .collect()
    }

    /// Copy every recorded offset into its place in `offsets`.
    pub fn apply(&self, offsets: &mut ResolvedOffsets) {
        for field in Netvar::iter() {
            let value = self.get(field).unwrap_or(0);
            let target = match field {
                Netvar::Pawn => &mut offsets.controller.pawn,
                Netvar::SanitizedPlayerName => &mut offsets.controller.name,
                Netvar::CompTeammateColor => &mut offsets.controller.color,
                Netvar::InGameMoneyServices => &mut offsets.controller.money_services,
                Netvar::Health => &mut offsets.pawn.health,
                Netvar::ArmorValue => &mut offsets.pawn.armor,
                Netvar::TeamNum => &mut offsets.pawn.team,
                Netvar::LifeState => &mut offsets.pawn.life_state,
                Netvar::ClippingWeapon => &mut offsets.pawn.weapon,
                Netvar::BulletServices => &mut offsets.pawn.bullet_services,
                Netvar::WeaponServices => &mut offsets.pawn.weapon_services,
                Netvar::OldOrigin => &mut offsets.pawn.position,
                Netvar::ObserverServices => &mut offsets.pawn.observer_services,
                Netvar::Account => &mut offsets.money_service.money,
                Netvar::TotalHitsOnServer => &mut offsets.bullet_service.total_hits,
                Netvar::MyWeapons => &mut offsets.weapon_service.my_weapons,
                Netvar::ActiveWeapon => &mut offsets.weapon_service.active_weapon,
                Netvar::ObserverTarget => &mut offsets.observer_service.target,
                Netvar::Ping => &mut offsets.controller.ping,
                Netvar::SteamId => &mut offsets.controller.steam_id,
                Netvar::EyeAngles => &mut offsets.pawn.eye_angles,
                Netvar::ItemServices => &mut offsets.pawn.item_services,
                Netvar::HasDefuser => &mut offsets.item_service.has_defuser,
                Netvar::HasHelmet => &mut offsets.item_service.has_helmet,
            };
            *target = value;
        }
    }
}

/// Result of a harvesting pass
#[derive(Debug, Clone)]
pub struct Harvest {
    pub offsets: NetvarOffsets,
    /// Descriptor candidates inspected before the scan stopped
    pub entries_visited: usize,
}

pub struct NetvarHarvester<'a> {
    dump: &'a [u8],
    image: ModuleImage,
    plausibility: &'a Plausibility,
}

impl<'a> NetvarHarvester<'a> {
    pub fn new(dump: &'a [u8], image: ModuleImage, plausibility: &'a Plausibility) -> Self {
        Self {
            dump,
            image,
            plausibility,
        }
    }

    /// Scan the dump from its end towards offset 8 and collect every field.
    ///
    /// Stops as soon as all tracked fields are known. If the scan runs out
    /// first, the pass still succeeds when every required field was found and
    /// fails with [`Error::OffsetResolutionIncomplete`] otherwise.
    pub fn harvest(&self) -> Result<Harvest> {
        let size = self.dump.len().min(self.image.size as usize);
        let mut offsets = NetvarOffsets::default();
        let mut entries_visited = 0usize;

        if size >= 16 {
            for entry in (1..=size - 8).rev().step_by(8) {
                entries_visited += 1;
                if self.visit(entry, &mut offsets) && offsets.all_found() {
                    debug!(
                        "All netvars found after {} entries (at dump offset 0x{:X})",
                        entries_visited, entry
                    );
                    return Ok(Harvest {
                        offsets,
                        entries_visited,
                    });
                }
            }
        }

        if !offsets.is_complete() {
            return Err(Error::OffsetResolutionIncomplete {
                missing: offsets.missing(),
            });
        }

        for field in Netvar::iter().filter(|field| offsets.get(*field).is_none()) {
            debug!("  {}: not found, left unset", field);
        }
        Ok(Harvest {
            offsets,
            entries_visited,
        })
    }

    /// Inspect one candidate descriptor; returns true if a field was recorded.
    fn visit(&self, entry: usize, offsets: &mut NetvarOffsets) -> bool {
        match dump_u64(self.dump, entry) {
            Some(0) | None => return false,
            Some(_) => {}
        }

        let network_enabled = classify(self.dump, entry, &self.image);
        let name_at = if network_enabled { entry + 8 } else { entry };

        let Some(name_pointer) = dump_u64(self.dump, name_at) else {
            return false;
        };
        if !self.image.contains(name_pointer) {
            return false;
        }

        let Some(field) = dump_c_str(self.dump, (name_pointer - self.image.base) as usize)
            .and_then(|name| std::str::from_utf8(name).ok())
            .and_then(|name| name.parse::<Netvar>().ok())
        else {
            return false;
        };

        if field.requires_network_enable() && !network_enabled {
            return false;
        }
        if offsets.get(field).is_some() {
            return false;
        }

        let Some(offset) = dump_i32(self.dump, entry + field.offset_delta()) else {
            return false;
        };
        if field == Netvar::ArmorValue && !self.plausibility.armor_offset(offset) {
            debug!("Rejected {} candidate offset {}", field, offset);
            return false;
        }
        // Applies to every field, not only armor; a zero or negative offset
        // leaves the slot open for a later descriptor
        if offset <= 0 {
            return false;
        }

        debug!("  {}: 0x{:X}", field, offset);
        offsets.record(field, offset as u64)
    }
}
