//! Interface registry and console variable lookups

use tracing::debug;

use crate::elf::ElfImage;
use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::memory::layout::{convar, interface};
use crate::offset::signature::relative_address;

/// Name comparison used by both registries: the registered name is read for
/// `name.len()` bytes and cut at its first zero byte, so `"VEngineCvar0"`
/// matches a registration named `"VEngineCvar007"`.
fn name_matches<R: ReadMemory>(reader: &R, name_pointer: u64, name: &str) -> bool {
    if name_pointer == 0 {
        return false;
    }
    reader
        .read_name_prefix(name_pointer, name.len())
        .is_ok_and(|registered| registered == name)
}

/// Resolve the instance registered under `name` in a module's interface list.
///
/// The `CreateInterface` export starts with a `jmp` into the real factory,
/// whose body loads the registration list head a fixed distance in. Every
/// node's instance slot points at a small accessor that materialises the
/// instance with a RIP-relative `lea`.
pub fn resolve_interface<R: ReadMemory>(reader: &R, module_base: u64, name: &str) -> Result<u64> {
    let factory = ElfImage::new(reader, module_base).resolve_export(interface::FACTORY_EXPORT)?;
    let body = relative_address(reader, factory, interface::JMP_DISP, interface::JMP_LEN)?;
    let list_load = body.wrapping_add(interface::LIST_LOAD_DELTA);
    let head = relative_address(
        reader,
        list_load,
        interface::LIST_LOAD_DISP,
        interface::LIST_LOAD_LEN,
    )?;

    let mut node = reader.read_u64(head)?;
    let mut visited = 0usize;
    while node != 0 && visited < interface::MAX_NODES {
        visited += 1;

        let name_pointer = reader
            .read_u64(node.wrapping_add(interface::NODE_NAME))
            .unwrap_or_default();
        if name_matches(reader, name_pointer, name) {
            let accessor = reader.read_u64(node.wrapping_add(interface::NODE_INSTANCE))?;
            let instance = relative_address(
                reader,
                accessor,
                interface::FACTORY_DISP,
                interface::FACTORY_LEN,
            )?;
            debug!("  {}: 0x{:X}", name, instance);
            return Ok(instance);
        }

        node = reader.read_u64(node.wrapping_add(interface::NODE_NEXT))?;
    }

    Err(Error::RegistryEntryNotFound(format!(
        "interface {} ({} registrations walked)",
        name, visited
    )))
}

/// Resolve a console variable object by name.
pub fn resolve_convar<R: ReadMemory>(reader: &R, cvar: u64, name: &str) -> Result<u64> {
    let objects = reader.read_u64(cvar.wrapping_add(convar::OBJECTS))?;
    let count = reader.read_i32(cvar.wrapping_add(convar::COUNT))?;
    if objects == 0 || count <= 0 {
        return Err(Error::RegistryEntryNotFound(format!(
            "convar {} (registry is empty)",
            name
        )));
    }

    for i in 0..count as u64 {
        let object = reader.read_u64(objects.wrapping_add(i * convar::SLOT_SIZE))?;
        if object == 0 {
            break;
        }

        let name_pointer = reader.read_u64(object.wrapping_add(convar::NAME)).unwrap_or_default();
        if name_matches(reader, name_pointer, name) {
            debug!("  {}: 0x{:X}", name, object);
            return Ok(object);
        }
    }

    Err(Error::RegistryEntryNotFound(format!("convar {}", name)))
}
