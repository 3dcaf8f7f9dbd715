use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "ssm-build")]
#[command(about = "Generate, snapshot and package the C sources of a state-space model")]
pub struct CliArgs {
    /// Path to the TOML build configuration
    #[arg(short, long, default_value = "ssm-build.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Keep an existing workspace instead of rebuilding it from the templates
    #[arg(long)]
    pub keep_existing: bool,

    /// Override the archive setting from the config
    #[arg(long)]
    pub archive: Option<bool>,

    /// Compute every module bundle without writing anything
    #[arg(long)]
    pub dry_run: bool,
}
