pub mod collection;
mod dump;
pub mod interface;
pub mod netvar;
mod resolver;
pub mod signature;

pub use collection::{
    BulletServiceOffsets, ControllerOffsets, ConvarAddresses, DirectAddresses,
    InterfaceAddresses, ItemServiceOffsets, LibraryAddresses, MoneyServiceOffsets,
    ObserverServiceOffsets, PawnOffsets, ResolvedOffsets, WeaponServiceOffsets,
};
pub use dump::{MemorySamples, OffsetDump};
pub use interface::{resolve_convar, resolve_interface};
pub use netvar::{Harvest, NETWORK_ENABLE, Netvar, NetvarHarvester, NetvarOffsets, classify};
pub use resolver::{OffsetResolver, resolve};
pub use signature::{
    CodeSignature, find_masked, format_pattern, parse_pattern, relative_address, scan_pattern,
};
