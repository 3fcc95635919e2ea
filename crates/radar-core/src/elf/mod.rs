//! In-memory ELF image analysis
//!
//! A loaded module is treated as an ELF image starting at its base address.
//! Only the pieces needed to size the image, find the dynamic segment and
//! resolve exported symbols are parsed; everything is read straight out of
//! the target through [`ReadMemory`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::memory::layout::elf;

/// Dump chunk size; unreadable chunks are retried page by page
const DUMP_CHUNK: usize = 1024 * 1024;
const PAGE_SIZE: usize = 0x1000;

/// A module's base address and computed image size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleImage {
    pub base: u64,
    pub size: u64,
}

impl ModuleImage {
    /// Whether `address` falls inside `[base, base + size]`.
    ///
    /// The upper bound is inclusive, matching how pointers are range-checked
    /// while harvesting netvars.
    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address <= self.base.saturating_add(self.size)
    }
}

pub struct ElfImage<'a, R: ReadMemory> {
    reader: &'a R,
    base: u64,
}

impl<'a, R: ReadMemory> ElfImage<'a, R> {
    pub fn new(reader: &'a R, base: u64) -> Self {
        Self { reader, base }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// Turn a failed header read into a malformed-image error, unless the
    /// process itself is gone.
    fn header<T>(&self, value: Result<T>, field: &str) -> Result<T> {
        value.map_err(|e| match e {
            Error::ProcessUnavailable(_) => e,
            other => Error::malformed(self.base, format!("cannot read {}: {}", field, other)),
        })
    }

    /// Image size: section header table offset + entry size × entry count.
    pub fn image_size(&self) -> Result<u64> {
        let sh_offset = self.header(
            self.reader.read_u64(self.base.wrapping_add(elf::SECTION_HEADER_OFFSET)),
            "e_shoff",
        )?;
        let sh_entry_size = self.header(
            self.reader.read_u16(self.base.wrapping_add(elf::SECTION_HEADER_ENTRY_SIZE)),
            "e_shentsize",
        )?;
        let sh_num_entries = self.header(
            self.reader.read_u16(self.base.wrapping_add(elf::SECTION_HEADER_NUM_ENTRIES)),
            "e_shnum",
        )?;

        let size = sh_offset
            .checked_add(sh_entry_size as u64 * sh_num_entries as u64)
            .ok_or_else(|| Error::malformed(self.base, "image size overflows"))?;

        if size == 0 || size > elf::MAX_IMAGE_SIZE {
            return Err(Error::malformed(
                self.base,
                format!("implausible image size {:#x}", size),
            ));
        }
        Ok(size)
    }

    pub fn module_image(&self) -> Result<ModuleImage> {
        Ok(ModuleImage {
            base: self.base,
            size: self.image_size()?,
        })
    }

    /// Read the whole image into a local buffer.
    ///
    /// Regions that cannot be read (gaps between segments) are left zeroed.
    pub fn dump(&self) -> Result<Vec<u8>> {
        let size = self.image_size()? as usize;
        let mut buffer = vec![0u8; size];
        let mut unreadable_pages = 0usize;

        let mut offset = 0usize;
        while offset < size {
            let len = DUMP_CHUNK.min(size - offset);
            match self.reader.read_bytes(self.base.wrapping_add(offset as u64), len) {
                Ok(bytes) => buffer[offset..offset + len].copy_from_slice(&bytes),
                Err(e @ Error::ProcessUnavailable(_)) => return Err(e),
                Err(_) => {
                    let mut page = offset;
                    while page < offset + len {
                        let page_len = PAGE_SIZE.min(offset + len - page);
                        let at = self.base.wrapping_add(page as u64);
                        match self.reader.read_bytes(at, page_len) {
                            Ok(bytes) => buffer[page..page + page_len].copy_from_slice(&bytes),
                            Err(_) if page == 0 => {
                                return Err(Error::malformed(self.base, "header is unreadable"));
                            }
                            Err(_) => unreadable_pages += 1,
                        }
                        page += page_len;
                    }
                }
            }
            offset += len;
        }

        debug!(
            "Dumped module 0x{:X}: {:#x} bytes ({} unreadable pages)",
            self.base, size, unreadable_pages
        );
        Ok(buffer)
    }

    pub fn check_magic(&self) -> Result<()> {
        let magic = self.header(self.reader.read_array::<4>(self.base), "e_ident")?;
        if magic != elf::MAGIC {
            return Err(Error::malformed(self.base, "bad ELF magic"));
        }
        Ok(())
    }

    /// Address of the first program header entry of type PT_DYNAMIC.
    pub fn find_dynamic_segment(&self) -> Result<u64> {
        let ph_offset = self.header(
            self.reader.read_u64(self.base.wrapping_add(elf::PROGRAM_HEADER_OFFSET)),
            "e_phoff",
        )?;
        let ph_entry_size = self.header(
            self.reader.read_u16(self.base.wrapping_add(elf::PROGRAM_HEADER_ENTRY_SIZE)),
            "e_phentsize",
        )? as u64;
        let ph_num_entries = self.header(
            self.reader.read_u16(self.base.wrapping_add(elf::PROGRAM_HEADER_NUM_ENTRIES)),
            "e_phnum",
        )? as u64;

        let first_entry = self.base.wrapping_add(ph_offset);
        for i in 0..ph_num_entries {
            let entry = first_entry.wrapping_add(i.wrapping_mul(ph_entry_size));
            let p_type = self.header(self.reader.read_u32(entry), "p_type")?;
            if p_type == elf::PT_DYNAMIC {
                return Ok(entry);
            }
        }

        Err(Error::malformed(self.base, "no dynamic segment"))
    }

    /// Value of the first dynamic entry carrying `tag`.
    pub fn dynamic_tag_address(&self, tag: u64) -> Result<u64> {
        let segment = self.find_dynamic_segment()?;
        let vaddr = self.header(
            self.reader.read_u64(segment.wrapping_add(elf::PHDR_VADDR)),
            "p_vaddr",
        )?;

        let mut address = self.base.wrapping_add(vaddr);
        for _ in 0..elf::MAX_DYN_ENTRIES {
            let entry_tag = self.header(self.reader.read_u64(address), "d_tag")?;
            if entry_tag == elf::DT_NULL {
                break;
            }
            if entry_tag == tag {
                return self.header(self.reader.read_u64(address.wrapping_add(8)), "d_val");
            }
            address = address.wrapping_add(elf::DYN_ENTRY_SIZE);
        }

        Err(Error::malformed(
            self.base,
            format!("dynamic tag {:#x} not present", tag),
        ))
    }

    /// Absolute address of the exported symbol `name`.
    pub fn resolve_export(&self, name: &str) -> Result<u64> {
        self.check_magic()?;

        let string_table = self.dynamic_tag_address(elf::DT_STRTAB)?;
        let symbol_table = self.dynamic_tag_address(elf::DT_SYMTAB)?;

        // Symbol 0 is the reserved null symbol
        let mut symbol = symbol_table.wrapping_add(elf::SYM_ENTRY_SIZE);
        for _ in 0..elf::MAX_SYMBOLS {
            let name_index = self.header(self.reader.read_u32(symbol), "st_name")?;
            if name_index == 0 {
                break;
            }

            let symbol_name = self
                .reader
                .read_c_string(string_table.wrapping_add(name_index as u64), elf::SYM_NAME_MAX)
                .unwrap_or_default();
            if symbol_name == name {
                let value = self.header(
                    self.reader.read_u64(symbol.wrapping_add(elf::SYM_VALUE)),
                    "st_value",
                )?;
                let address = self.base.wrapping_add(value);
                debug!("Export {} of 0x{:X}: 0x{:X}", name, self.base, address);
                return Ok(address);
            }
            symbol = symbol.wrapping_add(elf::SYM_ENTRY_SIZE);
        }

        Err(Error::SymbolNotFound(name.to_string()))
    }
}
