use crate::config::library;
use crate::memory::{ModuleLocator, ReadMemory};
use crate::offset::ResolvedOffsets;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Offset dump for diagnostic purposes
#[derive(Debug, Clone, Serialize)]
pub struct OffsetDump {
    pub libraries: BTreeMap<&'static str, String>,
    /// Mapped file of each library, or why it could not be found
    pub library_paths: BTreeMap<&'static str, String>,
    pub interfaces: BTreeMap<&'static str, String>,
    pub convars: BTreeMap<&'static str, String>,
    pub local_controller: String,
    /// Field offsets keyed by their registered member name
    pub netvars: BTreeMap<&'static str, String>,
    pub memory_samples: MemorySamples,
}

/// Raw bytes at a few resolved addresses
#[derive(Debug, Clone, Serialize)]
pub struct MemorySamples {
    pub local_controller_8bytes: String,
    pub teammates_are_enemies_value: String,
    pub crosshair_alpha_value: String,
}

fn hex(value: u64) -> String {
    format!("0x{:X}", value)
}

impl OffsetDump {
    /// Create a dump from resolved offsets and a memory reader
    pub fn from_offsets<R: ReadMemory + ModuleLocator>(
        offsets: &ResolvedOffsets,
        reader: &R,
    ) -> Self {
        let libraries = BTreeMap::from([
            ("client", hex(offsets.libraries.client)),
            ("engine", hex(offsets.libraries.engine)),
            ("tier0", hex(offsets.libraries.tier0)),
        ]);

        let library_paths = [
            ("client", library::CLIENT),
            ("engine", library::ENGINE),
            ("tier0", library::TIER0),
        ]
        .into_iter()
        .map(|(key, module)| {
            let path = reader
                .module_path(module)
                .unwrap_or_else(|e| format!("({})", e));
            (key, path)
        })
        .collect();

        let interfaces = BTreeMap::from([
            ("resource", hex(offsets.interfaces.resource)),
            ("entity", hex(offsets.interfaces.entity)),
            ("player", hex(offsets.interfaces.player)),
            ("cvar", hex(offsets.interfaces.cvar)),
        ]);

        let convars = BTreeMap::from([
            ("mp_teammates_are_enemies", hex(offsets.convars.teammates_are_enemies)),
            ("cl_crosshairalpha", hex(offsets.convars.crosshair_alpha)),
        ]);

        let netvars = BTreeMap::from([
            ("m_hPawn", hex(offsets.controller.pawn)),
            ("m_sSanitizedPlayerName", hex(offsets.controller.name)),
            ("m_iCompTeammateColor", hex(offsets.controller.color)),
            ("m_pInGameMoneyServices", hex(offsets.controller.money_services)),
            ("m_iHealth", hex(offsets.pawn.health)),
            ("m_ArmorValue", hex(offsets.pawn.armor)),
            ("m_iTeamNum", hex(offsets.pawn.team)),
            ("m_lifeState", hex(offsets.pawn.life_state)),
            ("m_pClippingWeapon", hex(offsets.pawn.weapon)),
            ("m_pBulletServices", hex(offsets.pawn.bullet_services)),
            ("m_pWeaponServices", hex(offsets.pawn.weapon_services)),
            ("m_vOldOrigin", hex(offsets.pawn.position)),
            ("m_pObserverServices", hex(offsets.pawn.observer_services)),
            ("m_iAccount", hex(offsets.money_service.money)),
            ("m_totalHitsOnServer", hex(offsets.bullet_service.total_hits)),
            ("m_hMyWeapons", hex(offsets.weapon_service.my_weapons)),
            ("m_hActiveWeapon", hex(offsets.weapon_service.active_weapon)),
            ("m_hObserverTarget", hex(offsets.observer_service.target)),
            ("m_iPing", hex(offsets.controller.ping)),
            ("m_steamID", hex(offsets.controller.steam_id)),
            ("m_angEyeAngles", hex(offsets.pawn.eye_angles)),
            ("m_pItemServices", hex(offsets.pawn.item_services)),
            ("m_bHasDefuser", hex(offsets.item_service.has_defuser)),
            ("m_bHasHelmet", hex(offsets.item_service.has_helmet)),
        ]);

        let memory_samples = MemorySamples {
            local_controller_8bytes: Self::read_memory_hex(
                reader,
                offsets.direct.local_controller,
                8,
            ),
            teammates_are_enemies_value: Self::read_memory_hex(
                reader,
                convar_value(offsets.convars.teammates_are_enemies),
                4,
            ),
            crosshair_alpha_value: Self::read_memory_hex(
                reader,
                convar_value(offsets.convars.crosshair_alpha),
                4,
            ),
        };

        Self {
            libraries,
            library_paths,
            interfaces,
            convars,
            local_controller: hex(offsets.direct.local_controller),
            netvars,
            memory_samples,
        }
    }

    fn read_memory_hex<R: ReadMemory>(reader: &R, address: u64, size: usize) -> String {
        if address == 0 {
            return "(address is 0)".to_string();
        }

        match reader.read_bytes(address, size) {
            Ok(bytes) => bytes
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => "(read failed)".to_string(),
        }
    }

    /// Save dump to JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn convar_value(convar: u64) -> u64 {
    match convar {
        0 => 0,
        object => object.wrapping_add(crate::memory::layout::convar::VALUE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;
    use crate::offset::collection::tests::complete_offsets;

    #[test]
    fn test_dump_formats_hex() {
        let offsets = complete_offsets();
        let mem = MockMemoryBuilder::new()
            .u64(offsets.direct.local_controller, 0x1122_3344)
            .i32(offsets.convars.teammates_are_enemies + 0x40, 1)
            .module("/opt/cs2/game/csgo/bin/linuxsteamrt64/libclient.so", offsets.libraries.client)
            .build();

        let dump = OffsetDump::from_offsets(&offsets, &mem);
        assert_eq!(dump.libraries["client"], "0x700000000000");
        assert_eq!(dump.netvars["m_hPawn"], "0x60C");
        assert_eq!(dump.netvars.len(), 24);
        assert_eq!(dump.netvars["m_bHasHelmet"], "0x41");
        assert_eq!(
            dump.library_paths["client"],
            "/opt/cs2/game/csgo/bin/linuxsteamrt64/libclient.so"
        );
        assert!(dump.library_paths["tier0"].contains("libtier0.so"));
        assert_eq!(dump.memory_samples.local_controller_8bytes, "44 33 22 11 00 00 00 00");
        assert_eq!(dump.memory_samples.teammates_are_enemies_value, "01 00 00 00");
        assert_eq!(dump.memory_samples.crosshair_alpha_value, "(read failed)");
    }

    #[test]
    fn test_save_writes_json() {
        let offsets = complete_offsets();
        let mem = MockMemoryBuilder::new().build();
        let dump = OffsetDump::from_offsets(&offsets, &mem);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offsets.json");
        dump.save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["interfaces"]["cvar"], "0x720000100000");
        assert_eq!(value["local_controller"], "0x700000200000");
    }
}
