/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Main executable for wppf-rs

use clap::Parser;
use wppf_rs::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    cli::run(cli)
}
