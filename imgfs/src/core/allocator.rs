// SPDX-License-Identifier: MIT

pub use crate::core::errors::{FsCapacityError, FsCapacityResult};

/// Trait for managing allocation of logical units in a filesystem.
///
/// - `Unit` is the allocation unit identifier (e.g., a cluster index)
pub trait FsAllocator<Unit: Copy> {
    /// Claims a single free unit.
    fn allocate_unit(&mut self) -> FsCapacityResult<Unit>;

    /// Number of units currently used.
    fn used_units(&self) -> usize;

    /// Number of remaining units.
    fn remaining_units(&self) -> usize;
}
