//! Handle decoding and chunked entity table lookups
//!
//! Entities live in a table of up to 64 chunks of 512 slots, each slot 120
//! bytes wide with the object pointer first. A handle's low 15 bits select
//! the slot; the higher bits are a serial number and are ignored here.

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::memory::layout::entity;
use crate::offset::ResolvedOffsets;

/// Chunk and slot selected by a handle index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedHandle {
    pub chunk: u32,
    pub slot: u32,
}

pub fn decode_handle(index: u32) -> DecodedHandle {
    DecodedHandle {
        chunk: (index >> entity::CHUNK_SHIFT) & entity::CHUNK_MASK,
        slot: index & entity::SLOT_MASK,
    }
}

/// Object pointer at `index` in the table whose chunk-pointer array starts
/// at `chunks`.
pub fn lookup<R: ReadMemory>(reader: &R, chunks: u64, index: u32) -> Result<u64> {
    let handle = decode_handle(index);
    let chunk =
        reader.read_u64(chunks.wrapping_add(entity::CHUNK_POINTER_SIZE * handle.chunk as u64))?;
    if chunk == 0 {
        return Err(Error::InvalidHandle(index));
    }

    let object = reader.read_u64(chunk.wrapping_add(entity::SLOT_SIZE * handle.slot as u64))?;
    if object == 0 {
        return Err(Error::InvalidHandle(index));
    }
    Ok(object)
}

/// The local player's controller, read straight from its global.
pub fn local_controller<R: ReadMemory>(reader: &R, offsets: &ResolvedOffsets) -> Result<u64> {
    match reader.read_u64(offsets.direct.local_controller)? {
        0 => Err(Error::InvalidHandle(0)),
        controller => Ok(controller),
    }
}

/// Entity at `index` in the generic entity table.
pub fn resolve_handle<R: ReadMemory>(
    reader: &R,
    offsets: &ResolvedOffsets,
    index: u32,
) -> Result<u64> {
    lookup(
        reader,
        offsets.interfaces.entity.wrapping_add(entity::ENTITY_CHUNKS),
        index,
    )
}

/// Entity at `handle` in the player array.
pub fn resolve_player<R: ReadMemory>(
    reader: &R,
    offsets: &ResolvedOffsets,
    handle: u32,
) -> Result<u64> {
    lookup(reader, offsets.interfaces.player, handle & entity::INDEX_MASK)
}

/// Pawn owned by `controller`; fails when the controller has no pawn.
pub fn resolve_pawn<R: ReadMemory>(
    reader: &R,
    offsets: &ResolvedOffsets,
    controller: u64,
) -> Result<u64> {
    let handle = reader.read_i32(controller.wrapping_add(offsets.controller.pawn))?;
    if handle == -1 {
        return Err(Error::InvalidHandle(handle as u32));
    }
    resolve_player(reader, offsets, handle as u32)
}

/// Pawn the owner of `pawn` is spectating, if any.
pub fn observed_target<R: ReadMemory>(
    reader: &R,
    offsets: &ResolvedOffsets,
    pawn: u64,
) -> Option<u64> {
    let observer_services = reader
        .read_u64(pawn.wrapping_add(offsets.pawn.observer_services))
        .ok()
        .filter(|&services| services != 0)?;

    let target = reader
        .read_u32(observer_services.wrapping_add(offsets.observer_service.target))
        .ok()?
        & entity::INDEX_MASK;
    if target == 0 {
        return None;
    }

    resolve_player(reader, offsets, target).ok()
}
