use crate::error::{Error, Result};

/// Chunk size used when reading null-terminated strings.
const STRING_CHUNK: usize = 32;

/// Read access to another process's address space.
///
/// Addresses are plain numbers inside the target; nothing here is ever
/// dereferenced locally. Implementors only provide [`ReadMemory::read_bytes`],
/// the typed readers decode little-endian values on top of it.
pub trait ReadMemory {
    /// Read exactly `size` bytes starting at `address`.
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    fn read_array<const N: usize>(&self, address: u64) -> Result<[u8; N]> {
        let bytes = self.read_bytes(address, N)?;
        bytes.try_into().map_err(|_| Error::MemoryReadFailed {
            address,
            message: format!("short read, expected {} bytes", N),
        })
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        Ok(self.read_array::<1>(address)?[0])
    }

    fn read_u16(&self, address: u64) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array(address)?))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(address)?))
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array(address)?))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array(address)?))
    }

    fn read_i64(&self, address: u64) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array(address)?))
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array(address)?))
    }

    /// Read a null-terminated string of at most `max_len` bytes.
    ///
    /// Reads in small chunks and falls back to single bytes when a chunk
    /// straddles the end of a mapping. Fails only if nothing is readable.
    fn read_c_string(&self, address: u64, max_len: usize) -> Result<String> {
        let mut out: Vec<u8> = Vec::new();

        while out.len() < max_len {
            let at = address.wrapping_add(out.len() as u64);
            let want = (max_len - out.len()).min(STRING_CHUNK);
            match self.read_bytes(at, want) {
                Ok(chunk) => {
                    if let Some(end) = memchr::memchr(0, &chunk) {
                        out.extend_from_slice(&chunk[..end]);
                        break;
                    }
                    out.extend_from_slice(&chunk);
                }
                Err(e) => {
                    for i in 0..want as u64 {
                        match self.read_u8(at.wrapping_add(i)) {
                            Ok(0) => return Ok(String::from_utf8_lossy(&out).into_owned()),
                            Ok(b) => out.push(b),
                            Err(_) if out.is_empty() => return Err(e),
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }

        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Read `len` bytes and cut them at the first zero byte.
    ///
    /// Comparing the result against a name of the same length gives the
    /// prefix match used by the interface and console-variable registries.
    fn read_name_prefix(&self, address: u64, len: usize) -> Result<String> {
        let bytes = self.read_bytes(address, len)?;
        Ok(truncate_at_nul(&bytes))
    }
}

/// Write access to another process's address space.
pub trait WriteMemory {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()>;
}

/// Decode bytes up to the first zero byte (or the whole slice).
pub fn truncate_at_nul(bytes: &[u8]) -> String {
    let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Best-effort little-endian reads out of a local dump.
///
/// Out-of-range reads yield `None` instead of panicking.
pub fn dump_u64(dump: &[u8], offset: usize) -> Option<u64> {
    let bytes = dump.get(offset..offset.checked_add(8)?)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

pub fn dump_i32(dump: &[u8], offset: usize) -> Option<i32> {
    let bytes = dump.get(offset..offset.checked_add(4)?)?;
    Some(i32::from_le_bytes(bytes.try_into().ok()?))
}

/// String at `offset` inside a dump, bounded by the end of the dump.
pub fn dump_c_str(dump: &[u8], offset: usize) -> Option<&[u8]> {
    let tail = dump.get(offset..)?;
    let end = memchr::memchr(0, tail).unwrap_or(tail.len());
    Some(&tail[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;

    #[test]
    fn test_typed_reads_little_endian() {
        let mem = MockMemoryBuilder::new()
            .u64(0x1000, 0x1122_3344_5566_7788)
            .i32(0x1008, -5)
            .f32(0x100C, 1.5)
            .build();

        assert_eq!(mem.read_u64(0x1000).unwrap(), 0x1122_3344_5566_7788);
        assert_eq!(mem.read_u32(0x1000).unwrap(), 0x5566_7788);
        assert_eq!(mem.read_u16(0x1000).unwrap(), 0x7788);
        assert_eq!(mem.read_u8(0x1000).unwrap(), 0x88);
        assert_eq!(mem.read_i32(0x1008).unwrap(), -5);
        assert_eq!(mem.read_f32(0x100C).unwrap(), 1.5);
        assert!(mem.read_u64(0x2000).is_err());
    }

    #[test]
    fn test_read_c_string_stops_at_nul() {
        let mem = MockMemoryBuilder::new()
            .zeroed(0x1000, 0x100)
            .c_str(0x1000, "weapon_ak47")
            .build();
        assert_eq!(mem.read_c_string(0x1000, 128).unwrap(), "weapon_ak47");
        assert_eq!(mem.read_c_string(0x1000, 6).unwrap(), "weapon");
    }

    #[test]
    fn test_read_c_string_near_unmapped_end() {
        // String runs right up to the end of the mapping
        let mem = MockMemoryBuilder::new().bytes(0x1000, b"player\0").build();
        assert_eq!(mem.read_c_string(0x1000, 128).unwrap(), "player");
        assert!(mem.read_c_string(0x5000, 128).is_err());
    }

    #[test]
    fn test_read_name_prefix() {
        let mem = MockMemoryBuilder::new()
            .zeroed(0x1000, 0x40)
            .c_str(0x1000, "VEngineCvar007")
            .c_str(0x1020, "abc")
            .build();
        assert_eq!(mem.read_name_prefix(0x1000, 12).unwrap(), "VEngineCvar0");
        assert_eq!(mem.read_name_prefix(0x1020, 12).unwrap(), "abc");
    }

    #[test]
    fn test_dump_helpers_bounds() {
        let dump = [1u8, 0, 0, 0, 0, 0, 0, 0, b'h', b'i', 0, b'x'];
        assert_eq!(dump_u64(&dump, 0), Some(1));
        assert_eq!(dump_u64(&dump, 8), None);
        assert_eq!(dump_i32(&dump, 8), Some(i32::from_le_bytes([b'h', b'i', 0, b'x'])));
        assert_eq!(dump_c_str(&dump, 8), Some(&b"hi"[..]));
        assert_eq!(dump_c_str(&dump, 11), Some(&b"x"[..]));
        assert_eq!(dump_c_str(&dump, 40), None);
    }
}
