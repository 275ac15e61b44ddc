// SPDX-License-Identifier: MIT

use anyhow::{Context, bail};
use imgfs::{Directory, find_entry};

use crate::args::Session;

/// Creates every missing directory of each path.
pub fn mkdir(session: &mut Session, paths: &[String]) -> anyhow::Result<()> {
    for arg in paths {
        let path = session.path(arg)?;
        let root = session.root(&path.image)?;
        make_dir_path(root, &path.components())
            .with_context(|| format!("cannot create '{}'", path.raw))?;
        log_verbose!("created {}", path.raw);
    }
    Ok(())
}

/// Walks `components` from `root`, creating what is missing. Returns the
/// last directory.
fn make_dir_path(
    root: Box<dyn Directory>,
    components: &[&str],
) -> anyhow::Result<Box<dyn Directory>> {
    let mut dir = root;
    for name in components {
        dir = match find_entry(dir.as_ref(), name)? {
            None => dir.make_dir(name)?,
            Some(it) if it.kind().is_dir() => it.directory()?,
            Some(_) => bail!("path {components:?} includes a regular file"),
        };
    }
    Ok(dir)
}
