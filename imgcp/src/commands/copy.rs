// SPDX-License-Identifier: MIT

//! `copy SRC... DST`: files and directory trees between images and hosts.
//!
//! The destination is the last path. When it names an existing directory
//! every source lands inside it; otherwise it names a single file, created or
//! overwritten, and exactly one file source is accepted.

use anyhow::{Context, bail, ensure};
use imgfs::{DirIter, Directory, EntryKind, Found, find_entry, join_paths};

use crate::{
    args::{ImgPath, Session},
    commands::resolve,
    utils::{
        progress::copy_with_progress,
        string::{plural, pretty_bytes},
    },
};

enum Destination {
    Dir(Box<dyn Directory>),
    /// `name` inside `dir`, existing or not.
    File { dir: Box<dyn Directory>, name: String },
}

#[derive(Debug, Default)]
struct CopyStats {
    files: usize,
    bytes: u64,
}

pub fn copy(session: &mut Session, paths: &[String]) -> anyhow::Result<()> {
    let Some((dst_arg, sources)) = paths.split_last() else {
        bail!("at least two paths must be provided");
    };
    ensure!(!sources.is_empty(), "at least two paths must be provided");

    let dst_path = session.path(dst_arg)?;
    let mut stats = CopyStats::default();

    match destination(session, &dst_path)? {
        Destination::Dir(mut dir) => {
            for arg in sources {
                let src_path = session.path(arg)?;
                ensure!(
                    !contains(&src_path, &dst_path),
                    "cannot copy '{}' into itself",
                    src_path.raw
                );
                ensure!(
                    !same_entry(&src_path, &dst_path, src_path.last()),
                    "'{}' and its copy are the same entry",
                    src_path.raw
                );
                copy_to_dir(session, &src_path, dir.as_mut(), &mut stats)?;
            }
        }
        Destination::File { mut dir, name } => {
            ensure!(
                sources.len() == 1,
                "cannot copy multiple files into a single file"
            );
            let src_path = session.path(&sources[0])?;
            ensure!(
                !same_entry(&src_path, &dst_path, None),
                "'{}' and '{}' are the same file",
                src_path.raw,
                dst_path.raw
            );
            let Found::File(it) = resolve(session, &src_path)? else {
                bail!("'{}' is a directory not a file", src_path.raw);
            };
            copy_file(&src_path.raw, &name, it.as_ref(), dir.as_mut(), &mut stats)
                .with_context(|| format!("cannot copy '{}' to '{}'", src_path.raw, dst_path.raw))?;
        }
    }

    log_info!(
        "{} copied ({})",
        plural(stats.files, "file"),
        pretty_bytes(stats.bytes)
    );
    Ok(())
}

/// True when `dst` lies inside the directory `src` on the same image.
fn contains(src: &ImgPath, dst: &ImgPath) -> bool {
    src.image == dst.image
        && src.components.len() <= dst.components.len()
        && src
            .components
            .iter()
            .zip(&dst.components)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

/// True when `src` would be written over itself: `dst` joined with `name`
/// names the same entry on the same image.
fn same_entry(src: &ImgPath, dst: &ImgPath, name: Option<&str>) -> bool {
    let target: Vec<&str> = dst.components().into_iter().chain(name).collect();
    src.image == dst.image
        && src.components.len() == target.len()
        && src
            .components
            .iter()
            .zip(&target)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

fn destination(session: &mut Session, path: &ImgPath) -> anyhow::Result<Destination> {
    let mut dir = session.root(&path.image)?;
    let components = path.components();

    for (i, name) in components.iter().enumerate() {
        let is_last = i + 1 == components.len();
        match find_entry(dir.as_ref(), name)? {
            Some(it) if it.kind().is_dir() => dir = it.directory()?,
            Some(_) if !is_last => bail!("accessing a file as directory: '{}'", path.raw),
            Some(_) if path.is_dir => {
                bail!("destination '{}' is a file not a directory", path.raw)
            }
            None if !is_last => bail!("folder '{name}' in path '{}' does not exist", path.raw),
            None if path.is_dir => bail!("destination '{}' not found", path.raw),
            Some(_) | None => {
                return Ok(Destination::File {
                    dir,
                    name: name.to_string(),
                });
            }
        }
    }
    Ok(Destination::Dir(dir))
}

fn copy_to_dir(
    session: &mut Session,
    src_path: &ImgPath,
    dst: &mut dyn Directory,
    stats: &mut CopyStats,
) -> anyhow::Result<()> {
    match resolve(session, src_path)? {
        Found::Dir { dir, .. } => match src_path.last() {
            // The root is copied without a directory of its own.
            None => copy_tree(&src_path.raw, dir.as_ref(), dst, stats),
            Some(name) => {
                let mut sub = dst.make_dir(name)?;
                copy_tree(&src_path.raw, dir.as_ref(), sub.as_mut(), stats)
            }
        },
        Found::File(it) => {
            let name = src_path.last().unwrap_or_default();
            copy_file(&src_path.raw, name, it.as_ref(), dst, stats)
        }
    }
}

fn copy_tree(
    prefix: &str,
    src: &dyn Directory,
    dst: &mut dyn Directory,
    stats: &mut CopyStats,
) -> anyhow::Result<()> {
    let mut it = src.begin()?;
    while !it.end() {
        let name = it.name();
        let path = join_paths(prefix, &name);
        match it.kind() {
            EntryKind::Dir => {
                let sub_src = it.directory()?;
                let mut sub_dst = dst
                    .make_dir(&name)
                    .with_context(|| format!("cannot create '{path}'"))?;
                copy_tree(&path, sub_src.as_ref(), sub_dst.as_mut(), stats)?;
            }
            EntryKind::File => copy_file(&path, &name, it.as_ref(), dst, stats)?,
            EntryKind::DirSpecial | EntryKind::Special => log_verbose!("skipping {path}"),
        }
        it.next()?;
    }
    Ok(())
}

fn copy_file(
    path: &str,
    name: &str,
    src: &dyn DirIter,
    dst: &mut dyn Directory,
    stats: &mut CopyStats,
) -> anyhow::Result<()> {
    log_verbose!("copying {path} ...");

    let mut reader = src.file_reader()?;
    let mut writer = dst
        .file_writer(name)
        .with_context(|| format!("cannot create '{name}'"))?;
    let copied = copy_with_progress(reader.as_mut(), writer.as_mut(), src.size(), name)
        .with_context(|| format!("an error occurred while copying '{path}'"))?;
    writer.close()?;

    stats.files += 1;
    stats.bytes += copied;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ImageSet;

    #[test]
    fn test_contains() {
        let set = ImageSet::from_specs(&["a.img", "B=b.img"]).unwrap();
        let src = set.path("/DOCS/").unwrap();
        assert!(contains(&src, &set.path("/docs/old/").unwrap()));
        assert!(contains(&set.path("/").unwrap(), &src));
        assert!(!contains(&src, &set.path("/DATA/").unwrap()));
        assert!(!contains(&src, &set.path("B=/DOCS/").unwrap()));
    }

    #[test]
    fn test_same_entry() {
        let set = ImageSet::from_specs(&["a.img", "B=b.img"]).unwrap();
        let file = set.path("/DOCS/X.TXT").unwrap();
        assert!(same_entry(&file, &set.path("/docs/x.txt").unwrap(), None));
        assert!(same_entry(&file, &set.path("/DOCS/").unwrap(), Some("X.TXT")));
        assert!(!same_entry(&file, &set.path("/").unwrap(), Some("X.TXT")));
        assert!(!same_entry(&file, &set.path("B=/DOCS/X.TXT").unwrap(), None));
        assert!(!same_entry(&file, &set.path("/DOCS/Y.TXT").unwrap(), None));
    }
}
