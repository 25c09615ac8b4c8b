use std::{num::NonZero, path::PathBuf};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Print the names of all available input devices and exit.
    #[arg(long)]
    pub list_input_devices: bool,

    /// Listen on this input device instead of the one in the config file.
    #[arg(short, long)]
    pub device: Option<String>,

    /// Use this config file instead of the one in the config directory.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Amount of samples per frame (overrides the config file).
    #[arg(long)]
    pub frame_size: Option<NonZero<usize>>,

    /// Stop listening after this many seconds. Runs until <Enter> is pressed otherwise.
    #[arg(long)]
    pub duration: Option<u64>,
}
