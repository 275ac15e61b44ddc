// SPDX-License-Identifier: MIT

use std::io::{self, Write};

use imgfs::Found;

use crate::{args::Session, commands::resolve};

const CAT_BUF_SIZE: usize = 16 * 1024;

/// Streams files to standard output, one after the other.
pub fn cat(session: &mut Session, paths: &[String]) -> anyhow::Result<()> {
    let mut buf = vec![0u8; CAT_BUF_SIZE];
    let stdout = io::stdout();

    for arg in paths {
        let path = session.path(arg)?;
        anyhow::ensure!(!path.is_dir, "cat cannot be applied to directories");

        let Found::File(it) = resolve(session, &path)? else {
            anyhow::bail!("'{}' is a directory not a file", path.raw);
        };
        let mut reader = it.file_reader()?;
        let mut out = stdout.lock();
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
        }
        out.flush()?;
    }
    Ok(())
}
