// SPDX-License-Identifier: MIT

mod cat;
mod copy;
mod format;
mod list;
mod mkdir;
mod remove;
mod show;

pub use cat::cat;
pub use copy::copy;
pub use format::format;
pub use list::list;
pub use mkdir::mkdir;
pub use remove::remove;
pub use show::show;

use anyhow::Context;
use imgfs::{Found, find_path};

use crate::args::{ImgPath, Session};

/// Resolves `path` from the root of its image.
fn resolve(session: &mut Session, path: &ImgPath) -> anyhow::Result<Found> {
    let root = session.root(&path.image)?;
    find_path(root, &path.components(), path.is_dir)
        .with_context(|| format!("cannot resolve '{}'", path.raw))
}
