pub mod services;

use clap::Parser;

pub use services::{ServiceDescriptor, ServiceRegistry};

#[derive(Debug, Clone, Parser)]
#[command(name = "botlists")]
#[command(about = "Syncs a bot's guild count with third-party bot-list directories")]
pub struct CliConfig {
    #[arg(long, default_value = "0.0.0.0:3000")]
    pub bind_address: String,

    #[arg(long, default_value = "services.toml")]
    pub services_file: String,

    #[arg(long, default_value = "botlists.db")]
    pub database_path: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}
