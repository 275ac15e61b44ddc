// SPDX-License-Identifier: MIT

pub use crate::core::allocator::*;

use crate::fs::fat1216::{constant::FAT_FIRST_CLUSTER, table::FatTable};

/// First-fit cluster allocator over an in-memory allocation table.
///
/// Claimed clusters are immediately marked end-of-chain; linking them into a
/// chain is left to the caller through [`Fat1216Allocator::link`].
#[derive(Debug)]
pub struct Fat1216Allocator<'a> {
    table: &'a mut FatTable,
}

impl<'a> Fat1216Allocator<'a> {
    pub fn new(table: &'a mut FatTable) -> Self {
        Self { table }
    }

    /// Makes `next` follow `tail` in its chain.
    #[inline]
    pub fn link(&mut self, tail: u16, next: u16) {
        self.table.write(tail, next);
    }

    /// Frees every cluster of the chain after `first` and turns `first` into
    /// a one-cluster chain. Returns the number of clusters released.
    pub fn truncate(&mut self, first: u16) -> u32 {
        let next = self.table.chain(first);
        self.table.write(first, self.table.end_of_chain());
        self.release(next)
    }

    /// Frees a whole chain starting at `first`. Sentinel values end the walk,
    /// and so does a cluster already freed, which also breaks any cycle.
    pub fn release(&mut self, first: u16) -> u32 {
        let length = self.table.length();
        let bad = self.table.bad_cluster();
        let mut cluster = first;
        let mut freed = 0u32;

        while cluster >= FAT_FIRST_CLUSTER && cluster < length && cluster < bad {
            let next = self.table.chain(cluster);
            if next == 0 {
                break;
            }
            self.table.write(cluster, 0);
            freed += 1;
            cluster = next;
        }
        freed
    }
}

impl FsAllocator<u16> for Fat1216Allocator<'_> {
    fn allocate_unit(&mut self) -> FsCapacityResult<u16> {
        let free = (FAT_FIRST_CLUSTER..self.table.length()).find(|&i| self.table.get(i) == 0);
        match free {
            Some(cluster) => {
                self.table.write(cluster, self.table.end_of_chain());
                log::trace!("cluster {cluster} allocated");
                Ok(cluster)
            }
            None => Err(FsCapacityError::NoFreeCluster),
        }
    }

    fn used_units(&self) -> usize {
        (FAT_FIRST_CLUSTER..self.table.length())
            .filter(|&i| self.table.get(i) != 0)
            .count()
    }

    fn remaining_units(&self) -> usize {
        self.table.usage().free as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::fat1216::table::FatWidth;

    fn table(entries: u32) -> FatTable {
        let mut raw = vec![0u8; FatWidth::Fat12.table_bytes(entries).next_multiple_of(2)];
        raw[..3].copy_from_slice(&[0xF8, 0xFF, 0xFF]);
        FatTable::from_raw(FatWidth::Fat12, raw, 0xF8, entries).unwrap()
    }

    #[test]
    fn test_allocate_claims_first_free() {
        let mut t = table(8);
        t.write(2, 0xFFF);
        t.write(4, 0xFF7);

        let mut alloc = Fat1216Allocator::new(&mut t);
        assert_eq!(alloc.allocate_unit(), Ok(3));
        assert_eq!(alloc.allocate_unit(), Ok(5));
        assert_eq!(alloc.used_units(), 4);
        assert_eq!(alloc.remaining_units(), 2);
        assert_eq!(t.get(3), t.end_of_chain());
        assert!(t.is_dirty());
    }

    #[test]
    fn test_allocate_never_returns_reserved_or_used() {
        let mut t = table(16);
        let mut seen = Vec::new();
        let mut alloc = Fat1216Allocator::new(&mut t);
        while let Ok(c) = alloc.allocate_unit() {
            assert!(c >= 2);
            assert!(!seen.contains(&c));
            seen.push(c);
        }
        assert_eq!(seen.len(), 14);
        assert_eq!(alloc.allocate_unit(), Err(FsCapacityError::NoFreeCluster));
    }

    #[test]
    fn test_truncate_and_release() {
        let mut t = table(16);
        let mut alloc = Fat1216Allocator::new(&mut t);
        let a = alloc.allocate_unit().unwrap();
        let b = alloc.allocate_unit().unwrap();
        let c = alloc.allocate_unit().unwrap();
        alloc.link(a, b);
        alloc.link(b, c);

        assert_eq!(alloc.truncate(a), 2);
        assert_eq!(alloc.used_units(), 1);
        assert_eq!(alloc.release(a), 1);
        assert_eq!(alloc.used_units(), 0);
    }

    #[test]
    fn test_release_terminates_on_cycles() {
        let mut t = table(8);
        t.write(2, 3);
        t.write(3, 2);
        let mut alloc = Fat1216Allocator::new(&mut t);
        assert_eq!(alloc.release(2), 2);
        assert_eq!(alloc.used_units(), 0);
    }
}
