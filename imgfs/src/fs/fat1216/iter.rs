// SPDX-License-Identifier: MIT

use std::{io::Write, rc::Rc};

use imgio::prelude::*;

use crate::{
    core::{errors::*, image::*, utils::size_utils::num_bytes_to_str},
    fs::fat1216::{
        allocator::Fat1216Allocator,
        attr::FatAttributes,
        constant::*,
        dir::{DirStore, Fat1216Dir, SharedDirStore},
        name::{datetime_now, unpack_date, unpack_time},
        reader::Fat1216Reader,
        types::{Fat1216Entry, Fat1216LfnEntry},
        volume::{Fat1216Volume, SharedVolume},
    },
};

/// Byte cursor over raw directory content.
///
/// Long-name fragments are gathered while walking: a fragment with the
/// "last" flag starts a run, each following fragment must carry the previous
/// order minus one, and the short record closing a complete run (order 1)
/// takes the accumulated name. Any break in the sequence discards the run.
#[derive(Debug, Clone, Default)]
pub struct DirCursor {
    pos: usize,
    lfn_acc: Vec<u16>,
    lfn_last: u8,
    lfn_start: Option<usize>,
    long_name: Option<String>,
    long_start: Option<usize>,
}

impl DirCursor {
    /// Cursor on the first record, hidden records included.
    pub fn begin(data: &[u8]) -> Self {
        let mut cursor = Self::default();
        cursor.visit(data);
        cursor
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn end(&self, data: &[u8]) -> bool {
        self.pos + FAT_DIR_ENTRY_SIZE > data.len() || data[self.pos] == FAT_ENTRY_END_OF_DIR
    }

    /// Long name owned by the current record.
    #[inline]
    pub fn long_name(&self) -> Option<&str> {
        self.long_name.as_deref()
    }

    /// Position of the first fragment of the current record's long name.
    #[inline]
    pub fn long_name_start(&self) -> Option<usize> {
        self.long_start
    }

    pub fn advance(&mut self, data: &[u8]) {
        self.pos += FAT_DIR_ENTRY_SIZE;
        self.visit(data);
    }

    /// Moves past deleted records and long-name fragments.
    pub fn skip_hidden(&mut self, data: &[u8]) {
        while !self.end(data) && is_hidden_record(&data[self.pos..]) {
            self.advance(data);
        }
    }

    fn reset_run(&mut self) {
        self.lfn_acc.clear();
        self.lfn_last = 0;
        self.lfn_start = None;
    }

    fn visit(&mut self, data: &[u8]) {
        if self.end(data) {
            return;
        }
        let rec = &data[self.pos..self.pos + FAT_DIR_ENTRY_SIZE];

        if !FatAttributes::is_lfn(rec[11]) {
            let complete = self.lfn_last == 1 && rec[0] != FAT_ENTRY_DELETED;
            self.long_name = complete.then(|| String::from_utf16_lossy(&self.lfn_acc));
            self.long_start = if complete { self.lfn_start } else { None };
            self.reset_run();
            return;
        }

        let Some(lfn) = Fat1216LfnEntry::read(rec) else {
            return;
        };
        if rec[0] == FAT_ENTRY_DELETED {
            self.reset_run();
        } else if lfn.is_last() {
            self.reset_run();
            self.lfn_last = lfn.index();
            self.lfn_start = Some(self.pos);
            self.lfn_acc = lfn.extract_utf16();
        } else if self.lfn_last != 0 && lfn.index() + 1 == self.lfn_last {
            self.lfn_last = lfn.index();
            let mut chars = lfn.extract_utf16();
            chars.append(&mut self.lfn_acc);
            self.lfn_acc = chars;
        } else {
            self.reset_run();
        }
    }
}

fn is_hidden_record(rec: &[u8]) -> bool {
    rec[0] == FAT_ENTRY_DELETED || FatAttributes::is_lfn(rec[11])
}

/// Iterator over a FAT12/16 directory. Deleted records and long-name
/// fragments are never exposed.
pub struct Fat1216Iter {
    vol: SharedVolume,
    store: SharedDirStore,
    cursor: DirCursor,
}

impl Fat1216Iter {
    pub(crate) fn begin(vol: SharedVolume, store: SharedDirStore) -> Self {
        let cursor = {
            let s = store.borrow();
            let mut cursor = DirCursor::begin(s.data());
            cursor.skip_hidden(s.data());
            cursor
        };
        Self { vol, store, cursor }
    }

    fn entry(&self) -> FsResult<Fat1216Entry> {
        let store = self.store.borrow();
        if self.cursor.end(store.data()) {
            return Err(FsPathError::NotFound.into());
        }
        store
            .entry(self.cursor.pos())
            .ok_or(FsError::Other("Directory record out of range"))
    }

    /// Truncates the current file to a one-cluster empty chain, or gives it
    /// one when it has none, and refreshes its modification time. Returns the
    /// record position and first cluster.
    pub(crate) fn overwrite_file(
        &self,
        vol: &mut Fat1216Volume,
        io: &mut dyn ImgIO,
    ) -> FsResult<(usize, u16)> {
        let entry = self.entry()?;
        let attr = entry.attributes();
        if FatAttributes::is_lfn(entry.attr) || attr.contains(FatAttributes::DIRECTORY) {
            bail!(FsStateError::IsDirectory);
        }
        if attr.intersects(FatAttributes::SYSTEM | FatAttributes::VOLUME_ID | FatAttributes::HIDDEN) {
            bail!(FsStateError::Special);
        }
        if attr.contains(FatAttributes::READ_ONLY) {
            bail!(FsStateError::ReadOnly);
        }
        ensure!(attr.contains(FatAttributes::ARCHIVE), FsStateError::NotAFile);

        let cluster = match entry.cluster() {
            // Empty files written elsewhere may own no chain at all.
            0 => vol.alloc_cluster(io)?,
            first if first < FAT_FIRST_CLUSTER => {
                bail!(FsStateError::ReservedCluster(first as u32));
            }
            first => {
                let table = vol.table(io)?;
                if first >= table.bad_cluster() {
                    bail!(FsStateError::BadCluster(first as u32));
                }
                ensure!(
                    first < table.length(),
                    FsStateError::ClusterOutOfRange(first as u32)
                );
                Fat1216Allocator::new(table).truncate(first);
                first
            }
        };

        let pos = self.cursor.pos();
        let (date, time) = datetime_now();
        let mut store = self.store.borrow_mut();
        let rec = store.record_mut(pos)?;
        rec[26..28].copy_from_slice(&cluster.to_le_bytes());
        rec[18..20].copy_from_slice(&date.to_le_bytes());
        rec[22..24].copy_from_slice(&time.to_le_bytes());
        rec[24..26].copy_from_slice(&date.to_le_bytes());
        rec[28..32].fill(0);
        Ok((pos, cluster))
    }

    /// True when a sub-directory holds nothing besides "." and "..".
    fn is_empty_dir(dir: &DirStore) -> bool {
        let data = dir.data();
        let mut cursor = DirCursor::begin(data);
        cursor.skip_hidden(data);
        while !cursor.end(data) {
            let is_dot = dir.entry(cursor.pos()).is_some_and(|e| e.is_dot_or_dotdot());
            if !is_dot {
                return false;
            }
            cursor.advance(data);
            cursor.skip_hidden(data);
        }
        true
    }

    fn load_directory(&self, vol: &mut Fat1216Volume, cluster: u16) -> FsResult<DirStore> {
        let mut io = vol.open_io(OpenMode::Read)?;
        if cluster == 0 {
            // ".." of a first-level directory
            let geo = vol.geometry(io.as_mut())?;
            return DirStore::load_root(io.as_mut(), geo);
        }
        let (geo, table) = vol.load(io.as_mut())?;
        DirStore::load_chain(io.as_mut(), geo, table, cluster)
    }
}

impl DirIter for Fat1216Iter {
    fn compare_to_name(&self, name: &str) -> bool {
        let Ok(entry) = self.entry() else {
            return false;
        };
        let name = name.to_lowercase();
        if let Some(long) = self.cursor.long_name() {
            if long.trim().to_lowercase() == name {
                return true;
            }
        }
        entry.short_name().to_lowercase() == name
    }

    fn end(&self) -> bool {
        self.cursor.end(self.store.borrow().data())
    }

    fn next(&mut self) -> FsResult {
        let store = self.store.borrow();
        if !self.cursor.end(store.data()) {
            self.cursor.advance(store.data());
            self.cursor.skip_hidden(store.data());
        }
        Ok(())
    }

    fn name(&self) -> String {
        if let Some(long) = self.cursor.long_name() {
            let long = long.trim();
            if !long.is_empty() {
                return long.to_string();
            }
        }
        self.entry()
            .map(|e| e.short_name().to_uppercase())
            .unwrap_or_default()
    }

    fn kind(&self) -> EntryKind {
        let Ok(entry) = self.entry() else {
            return EntryKind::Special;
        };
        let attr = entry.attributes();
        if FatAttributes::is_lfn(entry.attr)
            || attr.intersects(FatAttributes::VOLUME_ID | FatAttributes::SYSTEM)
        {
            EntryKind::Special
        } else if attr.contains(FatAttributes::DIRECTORY) {
            if entry.is_dot_or_dotdot() {
                EntryKind::DirSpecial
            } else {
                EntryKind::Dir
            }
        } else if attr.contains(FatAttributes::ARCHIVE) {
            EntryKind::File
        } else {
            EntryKind::Special
        }
    }

    fn size(&self) -> u64 {
        self.entry().map(|e| e.size() as u64).unwrap_or(0)
    }

    fn directory(&self) -> FsResult<Box<dyn Directory>> {
        let entry = self.entry()?;
        ensure!(self.kind().is_dir(), FsPathError::NotADirectory);

        let store = self.load_directory(&mut self.vol.borrow_mut(), entry.cluster())?;
        Ok(Box::new(Fat1216Dir::new(Rc::clone(&self.vol), store)))
    }

    fn file_reader(&self) -> FsResult<Box<dyn FileReader>> {
        let entry = self.entry()?;
        ensure!(self.kind() == EntryKind::File, FsPathError::NotAFile);

        let mut io = self.vol.borrow().open_io(OpenMode::Read)?;
        let geo = self.vol.borrow_mut().geometry(io.as_mut())?.clone();
        Ok(Box::new(Fat1216Reader::new(
            Rc::clone(&self.vol),
            io,
            geo,
            entry.cluster(),
            entry.size(),
        )))
    }

    fn list(&self, out: &mut dyn Write) -> FsResult {
        let entry = self.entry()?;
        let flags: String = entry.attributes().flags_column().iter().collect();
        let size = num_bytes_to_str(entry.size() as u64);
        let (date, time) = entry.modified();
        let (yy, mm, dd) = unpack_date(date);
        let (h, m, s) = unpack_time(time);
        let name = match self.cursor.long_name().map(str::trim) {
            Some(long) if !long.is_empty() => long.to_string(),
            _ => entry.short_name(),
        };

        writeln!(
            out,
            "{flags}  {size:>10}  {dd:02}/{mm:02}/{yy:02}  {h:02}:{m:02}:{s:02}  {name}"
        )?;
        Ok(())
    }

    fn remove(&mut self) -> FsResult {
        let entry = self.entry()?;
        match self.kind() {
            EntryKind::File => {}
            EntryKind::Dir => {
                let dir = self.load_directory(&mut self.vol.borrow_mut(), entry.cluster())?;
                ensure!(Self::is_empty_dir(&dir), FsStateError::NotEmpty);
            }
            EntryKind::DirSpecial | EntryKind::Special => bail!(FsStateError::Special),
        }
        if entry.attributes().contains(FatAttributes::READ_ONLY) {
            bail!(FsStateError::ReadOnly);
        }

        let mut vol = self.vol.borrow_mut();
        let mut io = vol.open_io(OpenMode::ReadWrite)?;
        let table = vol.table(io.as_mut())?;
        let freed = Fat1216Allocator::new(table).release(entry.cluster());

        let pos = self.cursor.pos();
        let first = self.cursor.long_name_start().unwrap_or(pos);
        let mut store = self.store.borrow_mut();
        for rec in (first..=pos).step_by(FAT_DIR_ENTRY_SIZE) {
            store.record_mut(rec)?[0] = FAT_ENTRY_DELETED;
        }

        store.write_back(io.as_mut())?;
        vol.flush_table(io.as_mut())?;
        io.flush()?;
        log::debug!("{} removed, {freed} clusters released", entry.short_name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::fat1216::{
        formatter::{Fat1216Formatter, FormatOptions, FsFormatter},
        name::lfn_checksum,
        table::FatWidth,
        volume::Fat1216Image,
    };
    use zerocopy::IntoBytes;

    fn lfn_records(name: &str, short: &[u8; 11]) -> Vec<u8> {
        let units: Vec<u16> = name.encode_utf16().collect();
        let chunks: Vec<&[u16]> = units.chunks(FAT_LFN_CHARS).collect();
        let sum = lfn_checksum(short);
        let mut out = Vec::new();
        for (i, chunk) in chunks.iter().enumerate().rev() {
            let order = (i + 1) as u8;
            let lfn = Fat1216LfnEntry::new(order, i + 1 == chunks.len(), chunk, sum);
            out.extend_from_slice(lfn.as_bytes());
        }
        out
    }

    fn short(name: &[u8; 11]) -> Vec<u8> {
        Fat1216Entry::new(*name, FatAttributes::ARCHIVE, 2, 0, 0)
            .as_bytes()
            .to_vec()
    }

    fn visible(data: &[u8]) -> Vec<(usize, Option<String>)> {
        let mut cursor = DirCursor::begin(data);
        cursor.skip_hidden(data);
        let mut out = Vec::new();
        while !cursor.end(data) {
            out.push((cursor.pos(), cursor.long_name().map(String::from)));
            cursor.advance(data);
            cursor.skip_hidden(data);
        }
        out
    }

    #[test]
    fn test_long_name_reconstruction() {
        let mut data = lfn_records("report_card.txt", b"REPORT~1TXT");
        data.extend(short(b"REPORT~1TXT"));
        data.extend(short(b"PLAIN   TXT"));
        data.extend([0u8; 32]);

        let seen = visible(&data);
        assert_eq!(
            seen,
            vec![(64, Some("report_card.txt".to_string())), (96, None)]
        );

        let mut cursor = DirCursor::begin(&data);
        cursor.skip_hidden(&data);
        assert_eq!(cursor.long_name_start(), Some(0));
    }

    #[test]
    fn test_lookup_by_long_and_short_name() {
        let opts = FormatOptions::default();
        let store = MemStore::new(vec![0u8; opts.total_sectors as usize * 512]);
        let mut io = store.open(OpenMode::ReadWrite).unwrap();
        Fat1216Formatter::new(io.as_mut(), &opts).format(false).unwrap();

        let mut records = lfn_records("report_card.txt", b"REPORT~1TXT");
        records.extend(short(b"REPORT~1TXT"));
        // root directory of a floppy: sector 19
        io.write_at(19 * 512, &records).unwrap();
        drop(io);

        let img = Fat1216Image::open(Box::new(store), FatWidth::Fat12);
        let root = img.root_directory().unwrap();

        let by_long = find_entry(root.as_ref(), "report_card.txt").unwrap().unwrap();
        let by_short = find_entry(root.as_ref(), "REPORT~1.TXT").unwrap().unwrap();
        assert_eq!(by_long.name(), "report_card.txt");
        assert_eq!(by_short.name(), "report_card.txt");
        assert_eq!(by_long.kind(), EntryKind::File);
        assert!(by_short.compare_to_name("Report_Card.TXT"));
        assert!(find_entry(root.as_ref(), "REPORT~1TXT").unwrap().is_none());

        let mut line = Vec::new();
        by_short.list(&mut line).unwrap();
        assert!(String::from_utf8(line).unwrap().trim_end().ends_with("report_card.txt"));

        // only one visible entry carries both names
        let mut it = root.begin().unwrap();
        it.next().unwrap();
        assert!(it.end());
    }

    #[test]
    fn test_broken_run_is_discarded() {
        let mut data = lfn_records("a_rather_long_file_name.txt", b"ARATHE~1TXT");
        // drop the middle fragment (order 2 of 3)
        data.drain(32..64);
        data.extend(short(b"ARATHE~1TXT"));

        assert_eq!(visible(&data), vec![(64, None)]);
    }

    #[test]
    fn test_deleted_records_are_skipped() {
        let mut data = short(b"GONE    TXT");
        data[0] = FAT_ENTRY_DELETED;
        data.extend(short(b"KEPT    TXT"));

        assert_eq!(visible(&data), vec![(32, None)]);
    }

    #[test]
    fn test_end_marker_stops_iteration() {
        let mut data = short(b"ONE     TXT");
        data.extend([0u8; 32]);
        data.extend(short(b"STALE   TXT"));

        assert_eq!(visible(&data).len(), 1);
    }
}
