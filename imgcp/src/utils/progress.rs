// SPDX-License-Identifier: MIT

use imgfs::{FileReader, FileWriter};
use indicatif::{ProgressBar, ProgressStyle};

use crate::utils::{LogLevel, log_level};

const COPY_BUF_SIZE: usize = 64 * 1024;

/// Streams `reader` into `writer`, drawing a bar at Normal level and above.
/// Returns the number of bytes copied. The writer is left open.
pub fn copy_with_progress(
    reader: &mut dyn FileReader,
    writer: &mut dyn FileWriter,
    total_size: u64,
    message: &str,
) -> anyhow::Result<u64> {
    let pb = if log_level() == LogLevel::Quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total_size)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.white}] {bytes}/{total_bytes} (ETA {eta_precise}) {msg}")?
            .progress_chars("█░░"),
    );
    pb.set_message(message.to_string());

    let mut buffer = vec![0u8; COPY_BUF_SIZE];
    let mut copied = 0u64;

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        let written = writer.write(&buffer[..n])?;
        anyhow::ensure!(written == n, "short write ({written} of {n} bytes)");

        copied += n as u64;
        pb.inc(n as u64);
    }

    pb.finish_and_clear();
    Ok(copied)
}
