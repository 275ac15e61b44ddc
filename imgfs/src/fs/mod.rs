// SPDX-License-Identifier: MIT

#[cfg(feature = "fat1216")]
pub mod fat1216;

#[cfg(feature = "folder")]
pub mod folder;

#[cfg(all(feature = "fat1216", feature = "folder"))]
pub mod detect;
