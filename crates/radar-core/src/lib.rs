//! # radar-core
//!
//! Core library for the radar external player reader.
//!
//! This crate provides:
//! - Linux process memory access through `/proc/<pid>/mem`
//! - ELF export lookup and module image dumps
//! - Offset resolution via signature scanning, interface registries and
//!   schema descriptor harvesting
//! - Entity table traversal producing per-tick player snapshots

pub mod config;
pub mod elf;
pub mod error;
pub mod game;
pub mod memory;
pub mod offset;

pub use config::Plausibility;
pub use elf::{ElfImage, ModuleImage};
pub use error::{Error, Result};
pub use game::{
    LifeState, PlayerSnapshot, Sweeper, Team, Vec3, decode_handle, is_free_for_all, sweep,
};
pub use memory::{ModuleLocator, ProcessHandle, ProcessInfo, ReadMemory, WriteMemory, find_process};
pub use offset::{OffsetDump, OffsetResolver, ResolvedOffsets, resolve};
