use tracing::debug;

use crate::elf::ElfImage;
use crate::error::{Error, Result};
use crate::memory::ReadMemory;

/// Byte pattern with a parallel "significant" mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSignature {
    pub bytes: Vec<u8>,
    pub mask: Vec<bool>,
}

impl CodeSignature {
    /// Parse an IDA-style pattern such as `"48 83 3D ?? ?? ?? ?? 00"`.
    pub fn parse(pattern: &str) -> Result<Self> {
        let tokens = parse_pattern(pattern)?;
        Ok(Self {
            bytes: tokens.iter().map(|b| b.unwrap_or(0)).collect(),
            mask: tokens.iter().map(Option::is_some).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<Option<u8>>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            bytes.push(None);
            continue;
        }

        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::InvalidPattern(format!("Invalid signature token '{}': {}", token, e))
        })?;
        bytes.push(Some(value));
    }

    if bytes.is_empty() {
        return Err(Error::InvalidPattern("Signature pattern is empty".to_string()));
    }

    Ok(bytes)
}

pub fn format_pattern(bytes: &[u8], mask: &[bool]) -> String {
    bytes
        .iter()
        .zip(mask)
        .map(|(b, significant)| match significant {
            true => format!("{:02X}", b),
            false => "??".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First offset in `buffer` where every significant byte matches.
pub fn find_masked(buffer: &[u8], pattern: &[u8], mask: &[bool]) -> Result<Option<usize>> {
    if pattern.len() != mask.len() {
        return Err(Error::PatternMaskMismatch {
            pattern: pattern.len(),
            mask: mask.len(),
        });
    }
    if pattern.is_empty() || buffer.len() < pattern.len() {
        return Ok(None);
    }

    let last = buffer.len() - pattern.len();
    'outer: for i in 0..=last {
        for (j, (&byte, &significant)) in pattern.iter().zip(mask).enumerate() {
            if significant && buffer[i + j] != byte {
                continue 'outer;
            }
        }
        return Ok(Some(i));
    }

    Ok(None)
}

/// Scan a module dump for `pattern` and return the absolute match address.
pub fn scan_pattern<R: ReadMemory>(
    reader: &R,
    pattern: &[u8],
    mask: &[bool],
    module_base: u64,
) -> Result<u64> {
    if pattern.len() != mask.len() {
        return Err(Error::PatternMaskMismatch {
            pattern: pattern.len(),
            mask: mask.len(),
        });
    }

    let dump = ElfImage::new(reader, module_base).dump()?;
    if dump.is_empty() {
        return Err(Error::PatternNotFound(format_pattern(pattern, mask)));
    }

    match find_masked(&dump, pattern, mask)? {
        Some(offset) => {
            let address = module_base.wrapping_add(offset as u64);
            debug!(
                "Pattern {} found at 0x{:X}",
                format_pattern(pattern, mask),
                address
            );
            Ok(address)
        }
        None => Err(Error::PatternNotFound(format_pattern(pattern, mask))),
    }
}

/// Resolve an instruction-relative operand: `instruction + length + disp32`.
pub fn relative_address<R: ReadMemory>(
    reader: &R,
    instruction: u64,
    disp_offset: u64,
    instruction_len: u64,
) -> Result<u64> {
    let disp = reader.read_i32(instruction.wrapping_add(disp_offset))?;
    Ok(instruction
        .wrapping_add(instruction_len)
        .wrapping_add_signed(disp as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::tests::{BASE, minimal_elf};
    use crate::memory::MockMemoryBuilder;

    #[test]
    fn test_parse_pattern_with_wildcards() {
        let sig = CodeSignature::parse("48 83 3D ?? ?? ?? ?? 00 0F 95 C0 C3").unwrap();
        assert_eq!(sig.len(), 12);
        assert_eq!(sig.bytes[0..3], [0x48, 0x83, 0x3D]);
        assert_eq!(
            sig.mask,
            vec![true, true, true, false, false, false, false, true, true, true, true, true]
        );
        assert_eq!(format_pattern(&sig.bytes, &sig.mask), "48 83 3D ?? ?? ?? ?? 00 0F 95 C0 C3");
    }

    #[test]
    fn test_parse_pattern_rejects_garbage() {
        assert!(matches!(parse_pattern("48 zz"), Err(Error::InvalidPattern(_))));
        assert!(matches!(parse_pattern("   "), Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn test_find_masked_ignores_wildcards() {
        let buffer = [0x00, 0x48, 0x8B, 0x01, 0xC3, 0x48, 0x8B, 0x77, 0x90];
        let pattern = [0x48, 0x8B, 0xFF, 0x90];
        let mask = [true, true, false, true];
        // Offset 1 fails on the last significant byte, offset 5 matches
        assert_eq!(find_masked(&buffer, &pattern, &mask).unwrap(), Some(5));
    }

    #[test]
    fn test_find_masked_first_match_wins() {
        let buffer = [0xAA, 0x01, 0xAA, 0x02, 0xAA, 0x03];
        assert_eq!(
            find_masked(&buffer, &[0xAA, 0x00], &[true, false]).unwrap(),
            Some(0)
        );
        assert_eq!(
            find_masked(&buffer, &[0xAA, 0x03], &[true, true]).unwrap(),
            Some(4)
        );
        assert_eq!(find_masked(&buffer, &[0xBB], &[true]).unwrap(), None);
    }

    #[test]
    fn test_mask_length_mismatch_fails_before_scanning() {
        // No memory at all: a scan attempt would fail with a read error instead
        let mem = MockMemoryBuilder::new().build();
        let err = scan_pattern(&mem, &[0x48, 0x83], &[true], BASE).unwrap_err();
        assert!(matches!(
            err,
            Error::PatternMaskMismatch {
                pattern: 2,
                mask: 1
            }
        ));
    }

    #[test]
    fn test_scan_pattern_in_module_dump() {
        let code = [0x48, 0x83, 0x3D, 0x10, 0x00, 0x00, 0x00, 0x00, 0x0F, 0x95, 0xC0, 0xC3];
        let mem = minimal_elf(MockMemoryBuilder::new(), BASE)
            .bytes(BASE + 0x210, &code)
            .build();
        let sig = CodeSignature::parse("48 83 3D ?? ?? ?? ?? 00 0F 95 C0 C3").unwrap();

        let found = scan_pattern(&mem, &sig.bytes, &sig.mask, BASE).unwrap();
        assert_eq!(found, BASE + 0x210);
        assert_eq!(relative_address(&mem, found, 0x03, 0x08).unwrap(), BASE + 0x210 + 8 + 0x10);
    }

    #[test]
    fn test_scan_pattern_not_found() {
        let mem = minimal_elf(MockMemoryBuilder::new(), BASE).build();
        let err = scan_pattern(&mem, &[0xDE, 0xAD, 0xBE, 0xEF], &[true; 4], BASE).unwrap_err();
        assert!(matches!(err, Error::PatternNotFound(_)));
    }

    #[test]
    fn test_relative_address_negative_displacement() {
        let mem = MockMemoryBuilder::new().i32(0x5001, -0x100).build();
        assert_eq!(relative_address(&mem, 0x5000, 1, 5).unwrap(), 0x5000 + 5 - 0x100);
    }
}
