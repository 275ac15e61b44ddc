// SPDX-License-Identifier: MIT

use anyhow::{Context, bail};
use imgfs::{Directory, EntryKind, Found, join_paths};

use crate::{args::Session, commands::resolve};

/// Removes files and directories. Directories must be empty unless
/// `recursive` is set; the root itself can only be emptied.
pub fn remove(session: &mut Session, paths: &[String], recursive: bool) -> anyhow::Result<()> {
    for arg in paths {
        let path = session.path(arg)?;
        match resolve(session, &path)? {
            Found::File(mut it) => {
                log_info!("Removing {} ...", path.raw);
                it.remove()
                    .with_context(|| format!("cannot remove '{}'", path.raw))?;
            }
            Found::Dir { dir, entry } => {
                if recursive {
                    remove_contents(&path.raw, dir.as_ref())?;
                }
                let Some(mut it) = entry else {
                    if recursive {
                        continue;
                    }
                    bail!("cannot remove the root directory of {}", path.image);
                };
                log_info!("Removing {} ...", path.raw);
                it.remove()
                    .with_context(|| format!("cannot remove '{}'", path.raw))?;
            }
        }
    }
    Ok(())
}

fn remove_contents(prefix: &str, dir: &dyn Directory) -> anyhow::Result<()> {
    let mut it = dir.begin()?;
    while !it.end() {
        let path = join_paths(prefix, &it.name());
        match it.kind() {
            EntryKind::Dir => {
                remove_contents(&path, it.directory()?.as_ref())?;
                log_verbose!("Removing {path} ...");
                it.remove()
                    .with_context(|| format!("cannot remove '{path}'"))?;
            }
            EntryKind::File => {
                log_verbose!("Removing {path} ...");
                it.remove()
                    .with_context(|| format!("cannot remove '{path}'"))?;
            }
            EntryKind::DirSpecial | EntryKind::Special => {}
        }
        it.next()?;
    }
    Ok(())
}
