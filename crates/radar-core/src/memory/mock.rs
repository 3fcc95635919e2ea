//! Synthetic address space for tests.
//!
//! Memory is sparse: only bytes that were explicitly written (or zero-filled)
//! are mapped, every other read fails like an unmapped page would.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::memory::{ModuleLocator, ReadMemory, WriteMemory};

#[derive(Debug, Default)]
pub struct MockMemoryBuilder {
    bytes: HashMap<u64, u8>,
    modules: HashMap<String, u64>,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(mut self, address: u64, data: &[u8]) -> Self {
        for (i, b) in data.iter().enumerate() {
            self.bytes.insert(address.wrapping_add(i as u64), *b);
        }
        self
    }

    /// Map `len` zero bytes, keeping anything already written there.
    pub fn zeroed(mut self, address: u64, len: usize) -> Self {
        for i in 0..len as u64 {
            self.bytes.entry(address.wrapping_add(i)).or_insert(0);
        }
        self
    }

    pub fn u8(self, address: u64, value: u8) -> Self {
        self.bytes(address, &[value])
    }

    pub fn u16(self, address: u64, value: u16) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    pub fn u32(self, address: u64, value: u32) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    pub fn i32(self, address: u64, value: i32) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    pub fn u64(self, address: u64, value: u64) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    pub fn f32(self, address: u64, value: f32) -> Self {
        self.bytes(address, &value.to_le_bytes())
    }

    /// Write a string followed by its terminating zero byte.
    pub fn c_str(self, address: u64, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        self.bytes(address, &data)
    }

    pub fn module(mut self, name: &str, base: u64) -> Self {
        self.modules.insert(name.to_string(), base);
        self
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            bytes: RefCell::new(self.bytes),
            modules: self.modules,
        }
    }
}

#[derive(Debug)]
pub struct MockMemoryReader {
    bytes: RefCell<HashMap<u64, u8>>,
    modules: HashMap<String, u64>,
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let bytes = self.bytes.borrow();
        (0..size as u64)
            .map(|i| {
                bytes
                    .get(&address.wrapping_add(i))
                    .copied()
                    .ok_or_else(|| Error::MemoryReadFailed {
                        address: address.wrapping_add(i),
                        message: "unmapped".to_string(),
                    })
            })
            .collect()
    }
}

impl WriteMemory for MockMemoryReader {
    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        let mut bytes = self.bytes.borrow_mut();
        for (i, b) in data.iter().enumerate() {
            match bytes.get_mut(&address.wrapping_add(i as u64)) {
                Some(slot) => *slot = *b,
                None => {
                    return Err(Error::MemoryReadFailed {
                        address: address.wrapping_add(i as u64),
                        message: "write to unmapped byte".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl ModuleLocator for MockMemoryReader {
    fn module_base(&self, module_name: &str) -> Result<u64> {
        self.modules
            .iter()
            .find(|(name, _)| name.contains(module_name))
            .map(|(_, base)| *base)
            .ok_or_else(|| Error::ModuleNotMapped(module_name.to_string()))
    }

    fn module_path(&self, module_name: &str) -> Result<String> {
        self.modules
            .keys()
            .find(|name| name.contains(module_name))
            .cloned()
            .ok_or_else(|| Error::ModuleNotMapped(module_name.to_string()))
    }
}
