use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Validate and provision game servers over HTTP.
#[derive(Debug, Parser)]
#[command(name = "pylon-paneld", version)]
pub struct Args {
    /// JSON configuration file. Defaults apply when none is given.
    #[arg(env = "PYLON_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration file.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,
}
