// SPDX-License-Identifier: MIT

use std::io::{self, Write};

use crate::args::Session;

/// Prints the description of every image.
pub fn show(session: &mut Session) -> anyhow::Result<()> {
    let names: Vec<(String, String)> = session
        .images()
        .iter()
        .map(|(name, file)| (name.to_string(), file.display().to_string()))
        .collect();
    let print_name = names.len() > 1;

    let stdout = io::stdout();
    for (name, file) in names {
        let img = session.image(&name)?;
        let mut out = stdout.lock();
        writeln!(out)?;
        if print_name {
            writeln!(out, "  {name}) \"{file}\"")?;
            writeln!(out)?;
        }
        img.print_info(&mut out, "    ")?;
        writeln!(out)?;
    }
    Ok(())
}
