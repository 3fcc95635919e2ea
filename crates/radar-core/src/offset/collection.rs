use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryAddresses {
    pub client: u64,
    pub engine: u64,
    pub tier0: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddresses {
    /// Game resource service (`GameResourceServiceClientV0`)
    pub resource: u64,
    /// Entity list base, read out of the resource service
    pub entity: u64,
    /// Player array base, `entity + 0x10`
    pub player: u64,
    /// Console variable system (`VEngineCvar0`)
    pub cvar: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvarAddresses {
    pub teammates_are_enemies: u64,
    pub crosshair_alpha: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectAddresses {
    /// Global holding the local player's controller pointer
    pub local_controller: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerOffsets {
    pub pawn: u64,           // handle m_hPawn
    pub name: u64,           // string pointer m_sSanitizedPlayerName
    pub color: u64,          // i32 m_iCompTeammateColor
    pub money_services: u64, // pointer m_pInGameMoneyServices
    pub ping: u64,           // i32 m_iPing, optional
    pub steam_id: u64,       // u64 m_steamID, optional
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PawnOffsets {
    pub health: u64,            // i32 m_iHealth
    pub armor: u64,             // i32 m_ArmorValue
    pub team: u64,              // u8 m_iTeamNum
    pub life_state: u64,        // u8 m_lifeState
    pub weapon: u64,            // pointer m_pClippingWeapon
    pub bullet_services: u64,   // pointer m_pBulletServices
    pub weapon_services: u64,   // pointer m_pWeaponServices
    pub position: u64,          // Vec3 m_vOldOrigin
    pub observer_services: u64, // pointer m_pObserverServices
    pub eye_angles: u64,        // QAngle m_angEyeAngles, optional
    pub item_services: u64,     // pointer m_pItemServices, optional
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyServiceOffsets {
    pub money: u64, // i32 m_iAccount
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletServiceOffsets {
    pub total_hits: u64, // i32 m_totalHitsOnServer
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponServiceOffsets {
    pub my_weapons: u64,    // vector m_hMyWeapons
    pub active_weapon: u64, // handle m_hActiveWeapon
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemServiceOffsets {
    pub has_defuser: u64, // bool m_bHasDefuser, optional
    pub has_helmet: u64,  // bool m_bHasHelmet, optional
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverServiceOffsets {
    pub target: u64, // handle m_hObserverTarget
}

/// Everything the traversal needs, resolved once per attach.
///
/// Built up by the resolver and only handed out once [`is_complete`] holds.
/// Fields marked optional may stay zero; the traversal then reports their
/// default value.
///
/// [`is_complete`]: ResolvedOffsets::is_complete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOffsets {
    pub libraries: LibraryAddresses,
    pub interfaces: InterfaceAddresses,
    pub convars: ConvarAddresses,
    pub direct: DirectAddresses,
    pub controller: ControllerOffsets,
    pub pawn: PawnOffsets,
    pub money_service: MoneyServiceOffsets,
    pub bullet_service: BulletServiceOffsets,
    pub weapon_service: WeaponServiceOffsets,
    pub observer_service: ObserverServiceOffsets,
    pub item_service: ItemServiceOffsets,
}

impl ResolvedOffsets {
    fn fields(&self) -> [(&'static str, u64); 28] {
        [
            ("libraries.client", self.libraries.client),
            ("libraries.engine", self.libraries.engine),
            ("libraries.tier0", self.libraries.tier0),
            ("interfaces.resource", self.interfaces.resource),
            ("interfaces.entity", self.interfaces.entity),
            ("interfaces.player", self.interfaces.player),
            ("interfaces.cvar", self.interfaces.cvar),
            ("convars.teammates_are_enemies", self.convars.teammates_are_enemies),
            ("convars.crosshair_alpha", self.convars.crosshair_alpha),
            ("direct.local_controller", self.direct.local_controller),
            ("m_hPawn", self.controller.pawn),
            ("m_sSanitizedPlayerName", self.controller.name),
            ("m_iCompTeammateColor", self.controller.color),
            ("m_pInGameMoneyServices", self.controller.money_services),
            ("m_iHealth", self.pawn.health),
            ("m_ArmorValue", self.pawn.armor),
            ("m_iTeamNum", self.pawn.team),
            ("m_lifeState", self.pawn.life_state),
            ("m_pClippingWeapon", self.pawn.weapon),
            ("m_pBulletServices", self.pawn.bullet_services),
            ("m_pWeaponServices", self.pawn.weapon_services),
            ("m_vOldOrigin", self.pawn.position),
            ("m_pObserverServices", self.pawn.observer_services),
            ("m_iAccount", self.money_service.money),
            ("m_totalHitsOnServer", self.bullet_service.total_hits),
            ("m_hMyWeapons", self.weapon_service.my_weapons),
            ("m_hActiveWeapon", self.weapon_service.active_weapon),
            ("m_hObserverTarget", self.observer_service.target),
        ]
    }

    /// Names of every required address or offset that is still zero.
    pub fn missing(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| *value == 0)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.fields().iter().all(|(_, value)| *value != 0)
    }
}
