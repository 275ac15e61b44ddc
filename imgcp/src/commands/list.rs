// SPDX-License-Identifier: MIT

use std::io;

use imgfs::Found;

use crate::{args::Session, commands::resolve};

/// Lists the content of directories, or the entry of files.
pub fn list(session: &mut Session, paths: &[String]) -> anyhow::Result<()> {
    let stdout = io::stdout();
    for arg in paths {
        let path = session.path(arg)?;
        let mut out = stdout.lock();
        match resolve(session, &path)? {
            Found::Dir { dir, .. } => {
                let mut it = dir.begin()?;
                while !it.end() {
                    it.list(&mut out)?;
                    it.next()?;
                }
            }
            Found::File(it) => it.list(&mut out)?,
        }
    }
    Ok(())
}
