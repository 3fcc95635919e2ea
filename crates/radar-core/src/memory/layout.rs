//! Memory layout constants for the target's data structures
//!
//! This module centralizes every fixed byte delta used while resolving offsets
//! and walking objects. Constants are organized by structure type.

/// 64-bit ELF header fields
pub mod elf {
    pub const MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

    pub const PROGRAM_HEADER_OFFSET: u64 = 0x20;
    pub const PROGRAM_HEADER_ENTRY_SIZE: u64 = 0x36;
    pub const PROGRAM_HEADER_NUM_ENTRIES: u64 = 0x38;

    pub const SECTION_HEADER_OFFSET: u64 = 0x28;
    pub const SECTION_HEADER_ENTRY_SIZE: u64 = 0x3A;
    pub const SECTION_HEADER_NUM_ENTRIES: u64 = 0x3C;

    /// Program header type of the dynamic segment (PT_DYNAMIC)
    pub const PT_DYNAMIC: u32 = 0x02;
    /// Virtual address field inside a program header entry
    pub const PHDR_VADDR: u64 = 0x10;

    /// Dynamic entries are tag/value pairs of 8 bytes each
    pub const DYN_ENTRY_SIZE: u64 = 0x10;
    pub const DT_NULL: u64 = 0x00;
    pub const DT_STRTAB: u64 = 0x05;
    pub const DT_SYMTAB: u64 = 0x06;

    /// Elf64_Sym record size
    pub const SYM_ENTRY_SIZE: u64 = 0x18;
    pub const SYM_VALUE: u64 = 0x08;
    /// Longest symbol name compared during export lookup
    pub const SYM_NAME_MAX: usize = 120;

    /// Upper bound for a mapped image (sanity check on header values)
    pub const MAX_IMAGE_SIZE: u64 = 1 << 30;
    /// Upper bound on dynamic entries walked before giving up
    pub const MAX_DYN_ENTRIES: u64 = 4096;
    /// Upper bound on symbols walked before giving up
    pub const MAX_SYMBOLS: u64 = 1 << 20;
}

/// Module interface registration (`CreateInterface`)
pub mod interface {
    pub const FACTORY_EXPORT: &str = "CreateInterface";

    /// `jmp rel32` at the export start
    pub const JMP_DISP: u64 = 0x01;
    pub const JMP_LEN: u64 = 0x05;
    /// Distance from the jump target to the list-head load instruction
    pub const LIST_LOAD_DELTA: u64 = 0x10;
    /// `mov reg, [rip+disp32]` loading the list head
    pub const LIST_LOAD_DISP: u64 = 0x03;
    pub const LIST_LOAD_LEN: u64 = 0x07;

    /// Registration node fields
    pub const NODE_INSTANCE: u64 = 0x00;
    pub const NODE_NAME: u64 = 0x08;
    pub const NODE_NEXT: u64 = 0x10;

    /// `lea rax, [rip+disp32]` at the start of each instance factory
    pub const FACTORY_DISP: u64 = 0x03;
    pub const FACTORY_LEN: u64 = 0x07;

    /// Upper bound on nodes walked in one list
    pub const MAX_NODES: usize = 4096;
}

/// Console variable registry inside the cvar interface
pub mod convar {
    pub const OBJECTS: u64 = 64;
    pub const COUNT: u64 = 160;
    pub const SLOT_SIZE: u64 = 16;
    pub const NAME: u64 = 0x00;
    /// Current integer value of a console variable object
    pub const VALUE: u64 = 0x40;
}

/// Chunked, handle-indexed entity tables
pub mod entity {
    /// Entity list pointer inside the game resource service
    pub const LIST_IN_RESOURCE: u64 = 0x50;
    /// Chunk-pointer array of the generic entity table
    pub const ENTITY_CHUNKS: u64 = 0x10;
    /// Player array base, relative to the entity list
    pub const PLAYER_ARRAY: u64 = 0x10;

    pub const CHUNK_POINTER_SIZE: u64 = 8;
    pub const SLOT_SIZE: u64 = 120;
    pub const CHUNK_SHIFT: u32 = 9;
    pub const CHUNK_MASK: u32 = 0x3F;
    pub const SLOT_MASK: u32 = 0x1FF;
    /// Dense index carried in the low bits of a handle
    pub const INDEX_MASK: u32 = 0x7FFF;
    /// Weapon handles only carry 12 index bits
    pub const WEAPON_INDEX_MASK: u32 = 0xFFF;
    pub const MAX_CONTROLLERS: u32 = 64;
}

/// Weapon instance → identity → designer name
pub mod weapon {
    pub const IDENTITY: u64 = 0x10;
    pub const DESIGNER_NAME: u64 = 0x20;
    /// `m_hMyWeapons` is a length followed by a data pointer
    pub const VECTOR_DATA: u64 = 0x08;
    pub const HANDLE_SIZE: u64 = 0x04;
}

/// Position vector (three consecutive f32)
pub mod vec3 {
    pub const X: u64 = 0x00;
    pub const Y: u64 = 0x04;
    pub const Z: u64 = 0x08;
}

/// Eye angles (pitch, yaw, roll as f32)
pub mod angles {
    pub const YAW: u64 = 0x04;
}

/// Longest strings read from the target
pub mod strings {
    pub const PLAYER_NAME_MAX: usize = 128;
    pub const WEAPON_NAME_MAX: usize = 64;
}

/// `cmp qword ptr [rip+disp32], 0; setnz al; ret` reading the local controller
pub mod local_controller {
    pub const PATTERN: &str = "48 83 3D ?? ?? ?? ?? 00 0F 95 C0 C3";
    pub const DISP: u64 = 0x03;
    /// The compare carries a trailing imm8, so the instruction is 8 bytes long
    pub const LEN: u64 = 0x08;
}
