use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spiderhook")]
#[command(about = "Webhook ingestion and download dispatch server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the webhook server and the periodic scheduler
    Server(ServerArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind to, overrides `server.bind_addr`
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Configuration file, overrides `SPIDERHOOK_CONFIG`
    #[arg(long)]
    pub config: Option<PathBuf>,
}
