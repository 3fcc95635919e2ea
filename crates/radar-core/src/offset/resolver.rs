use tracing::{debug, info};

use crate::config::{Plausibility, library, registry};
use crate::elf::{ElfImage, ModuleImage};
use crate::error::{Error, Result, StageContext};
use crate::memory::layout::{entity, local_controller};
use crate::memory::{ModuleLocator, ReadMemory};
use crate::offset::interface::{resolve_convar, resolve_interface};
use crate::offset::netvar::NetvarHarvester;
use crate::offset::signature::{CodeSignature, find_masked, format_pattern, relative_address};
use crate::offset::{LibraryAddresses, ResolvedOffsets};

/// Runs one full resolution pass against an attached process.
///
/// Any failing stage aborts the pass; a partially filled snapshot is never
/// returned.
pub struct OffsetResolver<'a, R: ReadMemory + ModuleLocator> {
    reader: &'a R,
    plausibility: Plausibility,
}

impl<'a, R: ReadMemory + ModuleLocator> OffsetResolver<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self {
            reader,
            plausibility: Plausibility::default(),
        }
    }

    pub fn with_plausibility(mut self, plausibility: Plausibility) -> Self {
        self.plausibility = plausibility;
        self
    }

    pub fn resolve(&self) -> Result<ResolvedOffsets> {
        let mut offsets = ResolvedOffsets {
            libraries: self.libraries().stage("libraries")?,
            ..Default::default()
        };
        debug!("Libraries:");
        debug!("  client: 0x{:X}", offsets.libraries.client);
        debug!("  engine: 0x{:X}", offsets.libraries.engine);
        debug!("  tier0: 0x{:X}", offsets.libraries.tier0);

        debug!("Engine interfaces:");
        offsets.interfaces.resource =
            resolve_interface(self.reader, offsets.libraries.engine, registry::RESOURCE_SERVICE)
                .stage("engine interfaces")?;

        // One copy of the client image serves the pattern scan and the netvar scan
        let client = ElfImage::new(self.reader, offsets.libraries.client);
        let client_image = client.module_image().stage("client image")?;
        let client_dump = client.dump().stage("client image")?;
        debug!(
            "Client image: 0x{:X} bytes at 0x{:X}",
            client_dump.len(),
            client_image.base
        );

        offsets.direct.local_controller = self
            .local_controller(&client_dump, client_image.base)
            .stage("local controller")?;
        debug!("Local controller: 0x{:X}", offsets.direct.local_controller);

        offsets.interfaces.entity = self
            .reader
            .read_u64(offsets.interfaces.resource.wrapping_add(entity::LIST_IN_RESOURCE))
            .stage("entity list")?;
        offsets.interfaces.player = offsets.interfaces.entity.wrapping_add(entity::PLAYER_ARRAY);
        debug!(
            "Entity list: 0x{:X}, player array: 0x{:X}",
            offsets.interfaces.entity, offsets.interfaces.player
        );

        debug!("Tier0 interfaces:");
        offsets.interfaces.cvar =
            resolve_interface(self.reader, offsets.libraries.tier0, registry::CVAR_SYSTEM)
                .stage("tier0 interfaces")?;

        debug!("Convars:");
        offsets.convars.teammates_are_enemies = resolve_convar(
            self.reader,
            offsets.interfaces.cvar,
            registry::TEAMMATES_ARE_ENEMIES,
        )
        .stage("convars")?;
        offsets.convars.crosshair_alpha =
            resolve_convar(self.reader, offsets.interfaces.cvar, registry::CROSSHAIR_ALPHA)
                .stage("convars")?;

        debug!("Netvars:");
        self.harvest_netvars(&client_dump, client_image, &mut offsets)
            .stage("netvars")?;

        let missing = offsets.missing();
        if !missing.is_empty() {
            return Err(Error::ResolutionFailed {
                stage: "snapshot",
                source: Box::new(Error::OffsetResolutionIncomplete { missing }),
            });
        }

        info!("Offsets resolved");
        Ok(offsets)
    }

    fn libraries(&self) -> Result<LibraryAddresses> {
        Ok(LibraryAddresses {
            client: self.reader.module_base(library::CLIENT)?,
            engine: self.reader.module_base(library::ENGINE)?,
            tier0: self.reader.module_base(library::TIER0)?,
        })
    }

    /// The local controller global is read by a `cmp qword ptr [rip+disp32], 0`
    /// in client code.
    fn local_controller(&self, client_dump: &[u8], client: u64) -> Result<u64> {
        let signature = CodeSignature::parse(local_controller::PATTERN)?;
        let offset = find_masked(client_dump, &signature.bytes, &signature.mask)?.ok_or_else(
            || Error::PatternNotFound(format_pattern(&signature.bytes, &signature.mask)),
        )?;
        let instruction = client.wrapping_add(offset as u64);
        debug!("Local controller pattern at 0x{:X}", instruction);
        relative_address(
            self.reader,
            instruction,
            local_controller::DISP,
            local_controller::LEN,
        )
    }

    fn harvest_netvars(
        &self,
        dump: &[u8],
        module: ModuleImage,
        offsets: &mut ResolvedOffsets,
    ) -> Result<()> {
        let harvest = NetvarHarvester::new(dump, module, &self.plausibility).harvest()?;
        debug!(
            "Netvar scan visited {} of {} entries",
            harvest.entries_visited,
            dump.len() / 8
        );
        harvest.offsets.apply(offsets);
        Ok(())
    }
}

/// Resolve every address and offset with default plausibility thresholds.
pub fn resolve<R: ReadMemory + ModuleLocator>(reader: &R) -> Result<ResolvedOffsets> {
    OffsetResolver::new(reader).resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::tests::minimal_elf;
    use crate::memory::MockMemoryBuilder;
    use crate::offset::interface::tests::{convar_system, interface_module};
    use crate::offset::netvar::tests::{Blob, FIELDS, all_fields};

    const CLIENT: u64 = 0x7f20_0000_0000;
    const ENGINE: u64 = 0x7f30_0000_0000;
    const TIER0: u64 = 0x7f40_0000_0000;

    const CLIENT_SIZE: usize = 0x4080;
    const PATTERN_AT: u64 = CLIENT + 0x2000;
    const LOCAL_CONTROLLER_GLOBAL: u64 = CLIENT + 0x10_0000;

    const RESOURCE: u64 = ENGINE + 0x20_0000;
    const CVAR: u64 = TIER0 + 0x20_0000;
    const CONVAR_OBJECTS: u64 = 0x3100_0000;
    const ENTITY_LIST: u64 = 0x5000_0000;

    /// A fully resolvable process: three libraries, both interfaces, both
    /// convars and a client image with every netvar descriptor.
    fn resolvable_process(fields: &[(&str, bool, usize, i32)]) -> MockMemoryBuilder {
        let mut blob = Blob::new(CLIENT, CLIENT_SIZE, 0x1000);
        blob.records(fields);

        let code = [0x48, 0x83, 0x3D, 0, 0, 0, 0, 0x00, 0x0F, 0x95, 0xC0, 0xC3];
        let disp = (LOCAL_CONTROLLER_GLOBAL - (PATTERN_AT + 8)) as i32;

        let builder = MockMemoryBuilder::new()
            .module("/game/csgo/bin/linuxsteamrt64/libclient.so", CLIENT)
            .module("/game/bin/linuxsteamrt64/libengine2.so", ENGINE)
            .module("/game/bin/linuxsteamrt64/libtier0.so", TIER0)
            .bytes(CLIENT, &blob.bytes);
        let builder = minimal_elf(builder, CLIENT)
            .u64(CLIENT + 0x28, (CLIENT_SIZE - 0x80) as u64) // e_shoff
            .bytes(PATTERN_AT, &code)
            .i32(PATTERN_AT + 3, disp);

        let builder = interface_module(
            builder,
            ENGINE,
            ENGINE + 0x10_0000,
            &[
                ("Source2EngineToClient001", ENGINE + 0x30_0000),
                ("GameResourceServiceClientV001", RESOURCE),
            ],
        )
        .u64(RESOURCE + entity::LIST_IN_RESOURCE, ENTITY_LIST);

        let builder = interface_module(
            builder,
            TIER0,
            TIER0 + 0x10_0000,
            &[("VEngineCvar007", CVAR)],
        );
        convar_system(
            builder,
            CVAR,
            CONVAR_OBJECTS,
            &["sv_cheats", "mp_teammates_are_enemies", "cl_crosshairalpha"],
            3,
        )
    }

    #[test]
    fn test_resolve_full_snapshot() {
        let mem = resolvable_process(&all_fields()).build();
        let offsets = resolve(&mem).unwrap();

        assert!(offsets.is_complete());
        assert_eq!(offsets.libraries.client, CLIENT);
        assert_eq!(offsets.libraries.engine, ENGINE);
        assert_eq!(offsets.libraries.tier0, TIER0);
        assert_eq!(offsets.interfaces.resource, RESOURCE);
        assert_eq!(offsets.interfaces.entity, ENTITY_LIST);
        assert_eq!(offsets.interfaces.player, ENTITY_LIST + 0x10);
        assert_eq!(offsets.interfaces.cvar, CVAR);
        assert_eq!(offsets.convars.teammates_are_enemies, CONVAR_OBJECTS + 0x2000);
        assert_eq!(offsets.convars.crosshair_alpha, CONVAR_OBJECTS + 0x3000);
        assert_eq!(offsets.direct.local_controller, LOCAL_CONTROLLER_GLOBAL);
        assert_eq!(offsets.controller.pawn, 0x60C);
        assert_eq!(offsets.pawn.health, 0x344);
        assert_eq!(offsets.observer_service.target, 0x44);
        assert_eq!(offsets.controller.ping, 0x7E8);
        assert_eq!(offsets.pawn.item_services, 0x10D0);
        assert_eq!(offsets.item_service.has_helmet, 0x41);
    }

    #[test]
    fn test_resolve_without_optional_netvars() {
        let mem = resolvable_process(&FIELDS).build();
        let offsets = resolve(&mem).unwrap();

        assert!(offsets.is_complete());
        assert_eq!(offsets.pawn.health, 0x344);
        assert_eq!(offsets.controller.ping, 0);
        assert_eq!(offsets.controller.steam_id, 0);
        assert_eq!(offsets.pawn.eye_angles, 0);
        assert_eq!(offsets.item_service.has_defuser, 0);
    }

    #[test]
    fn test_missing_local_controller_pattern() {
        let mem = resolvable_process(&FIELDS)
            // Break the trailing ret of the compare
            .u8(PATTERN_AT + 11, 0x90)
            .build();

        match resolve(&mem).unwrap_err() {
            Error::ResolutionFailed { stage, source } => {
                assert_eq!(stage, "local controller");
                assert!(matches!(*source, Error::PatternNotFound(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unloaded_library_aborts_resolution() {
        let mem = MockMemoryBuilder::new()
            .module("libclient.so", CLIENT)
            .module("libengine2.so", ENGINE)
            .build();

        match resolve(&mem).unwrap_err() {
            Error::ResolutionFailed { stage, source } => {
                assert_eq!(stage, "libraries");
                assert!(matches!(*source, Error::ModuleNotMapped(ref name) if name == "libtier0.so"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_netvar_aborts_resolution() {
        let fields: Vec<_> = FIELDS
            .iter()
            .copied()
            .filter(|(name, ..)| *name != "m_iAccount")
            .collect();
        let mem = resolvable_process(&fields).build();

        match resolve(&mem).unwrap_err() {
            Error::ResolutionFailed { stage, source } => {
                assert_eq!(stage, "netvars");
                assert!(matches!(
                    *source,
                    Error::OffsetResolutionIncomplete { ref missing } if missing == &vec!["m_iAccount"]
                ));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_convar_aborts_resolution() {
        let mem = resolvable_process(&FIELDS)
            // Rename the crosshair convar so the lookup fails
            .c_str(CONVAR_OBJECTS + 0x3000 + 0x800, "cl_crosshairgap")
            .build();

        let err = resolve(&mem).unwrap_err();
        assert!(matches!(err, Error::ResolutionFailed { stage: "convars", .. }));
        assert!(!err.is_process_gone());
    }
}
