// SPDX-License-Identifier: MIT

#[macro_use]
mod utils;
mod args;
mod commands;

use clap::{Parser, Subcommand};
use imgfs::fat1216::{FatWidth, FormatOptions};

use crate::{
    args::{ImageSet, Session},
    utils::{LogLevel, string::parse_size},
};

#[derive(Parser)]
#[command(
    name = "imgcp",
    version,
    about = "Browse and copy files between FAT12/16 images and host folders",
    long_about = None
)]
struct Cli {
    /// Image file or host folder, optionally named (repeatable)
    #[arg(short = 'i', long = "image", value_name = "[NAME=]FILE", required = true)]
    images: Vec<String>,

    /// Read image files as FAT12 instead of probing them
    #[arg(long, conflicts_with = "fat16")]
    fat12: bool,

    /// Read image files as FAT16 instead of probing them
    #[arg(long)]
    fat16: bool,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print every file processed and the engine's debug records
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe every image (default)
    #[command(visible_alias = "sh")]
    Show,

    /// List directories and files
    #[command(visible_alias = "ls")]
    List {
        #[arg(required = true, value_name = "[NAME=]PATH")]
        paths: Vec<String>,
    },

    /// Write files to standard output
    Cat {
        #[arg(required = true, value_name = "[NAME=]PATH")]
        paths: Vec<String>,
    },

    /// Create directories, with every missing parent
    #[command(visible_alias = "md")]
    Mkdir {
        #[arg(required = true, value_name = "[NAME=]PATH")]
        paths: Vec<String>,
    },

    /// Copy files and directories; the last path is the destination
    #[command(visible_alias = "cp")]
    Copy {
        #[arg(required = true, num_args = 2.., value_name = "[NAME=]PATH")]
        paths: Vec<String>,
    },

    /// Remove files and empty directories
    #[command(visible_alias = "remove")]
    Rm {
        /// Remove directories and their content
        #[arg(short, long)]
        recursive: bool,

        #[arg(required = true, value_name = "[NAME=]PATH")]
        paths: Vec<String>,
    },

    /// Write a blank FAT12/16 volume, creating the image file if needed
    Format {
        /// Image to format (the default image when omitted)
        #[arg(value_name = "NAME")]
        image: Option<String>,

        /// Volume size, e.g. 1440K or 16M
        #[arg(short, long, default_value = "1440K", value_parser = parse_size)]
        size: u64,

        #[arg(long, default_value_t = 1)]
        sectors_per_cluster: u8,

        #[arg(long, default_value_t = 224)]
        root_entries: u16,

        /// Volume label (up to 11 characters)
        #[arg(short, long)]
        label: Option<String>,

        /// Also zero the data area
        #[arg(long)]
        full: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    };
    utils::log::init(level);

    let width = match (cli.fat12, cli.fat16) {
        (true, _) => Some(FatWidth::Fat12),
        (_, true) => Some(FatWidth::Fat16),
        _ => None,
    };
    let mut session = Session::new(ImageSet::from_specs(&cli.images)?, width);

    match cli.command.unwrap_or(Commands::Show) {
        Commands::Show => commands::show(&mut session)?,
        Commands::List { paths } => commands::list(&mut session, &paths)?,
        Commands::Cat { paths } => commands::cat(&mut session, &paths)?,
        Commands::Mkdir { paths } => commands::mkdir(&mut session, &paths)?,
        Commands::Copy { paths } => commands::copy(&mut session, &paths)?,
        Commands::Rm { recursive, paths } => commands::remove(&mut session, &paths, recursive)?,
        Commands::Format {
            image,
            size,
            sectors_per_cluster,
            root_entries,
            label,
            full,
        } => {
            let opts = FormatOptions {
                sectors_per_cluster,
                root_entries,
                volume_label: label,
                ..FormatOptions::with_size(size)
            };
            commands::format(&session, image.as_deref(), opts, full)?
        }
    }

    Ok(())
}
