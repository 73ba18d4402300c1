//! voicegate CLI - manage voice prints and inspect trust policy.

use clap::{Parser, Subcommand};

mod commands;

use commands::{
    AssessCommand, DeleteCommand, EnrollCommand, IdentifyCommand, ListCommand, PinHashCommand,
    PolicyCommand, UpdateCommand, VerifyCommand,
};

/// voicegate CLI - voice-print store and trust policy tool.
///
/// Embeddings are read as JSON arrays of numbers, from a file or from
/// stdin when the path is `-`. Voice prints live in a redb file
/// (default ~/.voicegate/prints.redb).
#[derive(Parser)]
#[command(name = "voicegate")]
#[command(about = "Voice biometric enrollment and trust policy tool")]
#[command(version)]
pub struct Cli {
    /// Config file (YAML). Defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Voice-print database; overrides storage.path from the config
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enroll a user from two or more embeddings
    Enroll(EnrollCommand),
    /// 1:1 verification of a probe against a user's print
    Verify(VerifyCommand),
    /// 1:N identification of a probe
    Identify(IdentifyCommand),
    /// Blend a new sample into a user's print
    Update(UpdateCommand),
    /// Delete a user's print
    Delete(DeleteCommand),
    /// List enrolled users
    List(ListCommand),
    /// Score trust signals
    Assess(AssessCommand),
    /// Show required factors and allowed operations for trust levels
    Policy(PolicyCommand),
    /// Hash a PIN for storage
    #[command(name = "pin-hash")]
    PinHash(PinHashCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = commands::load_config(&cli)?;

    let mut log = cfg.log.clone();
    if cli.verbose {
        log.level = "debug".into();
    }
    voicegate::init_logging(&log)?;

    match &cli.command {
        Commands::Enroll(cmd) => cmd.run(&cli, &cfg),
        Commands::Verify(cmd) => cmd.run(&cli, &cfg),
        Commands::Identify(cmd) => cmd.run(&cli, &cfg),
        Commands::Update(cmd) => cmd.run(&cli, &cfg),
        Commands::Delete(cmd) => cmd.run(&cli, &cfg),
        Commands::List(cmd) => cmd.run(&cli, &cfg),
        Commands::Assess(cmd) => cmd.run(&cli, &cfg),
        Commands::Policy(cmd) => cmd.run(&cli, &cfg),
        Commands::PinHash(cmd) => cmd.run(&cli),
    }
}
