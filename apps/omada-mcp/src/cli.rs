//! Command-line interface.
//!
//! - `stdio` (default): serve one MCP session over stdin/stdout
//! - `serve`: run the Streamable HTTP server

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "omada-mcp")]
#[command(about = "MCP server for the TP-Link Omada controller Open API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve MCP over stdin/stdout (default if no subcommand given)
    Stdio,

    /// Serve MCP over Streamable HTTP
    Serve {
        /// Bind address, overrides HOST
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Stdio)
    }
}
