// SPDX-License-Identifier: MIT

#[macro_use]
pub mod log;
pub mod progress;
pub mod string;

pub use self::log::*;
