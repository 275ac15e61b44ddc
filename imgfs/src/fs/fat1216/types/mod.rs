// SPDX-License-Identifier: MIT

mod boot;
mod entry;

pub use boot::*;
pub use entry::*;
