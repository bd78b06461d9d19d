use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "phantom",
    version,
    about = "A tabbed terminal dashboard for system stats, HTTP requests and kind clusters."
)]
pub struct CliArgs {
    /// Path to the YAML config (templates and environment)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dashboard polling interval in milliseconds
    #[arg(long, default_value_t = 2_000)]
    pub tick_ms: u64,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// File that receives log output
    #[arg(long, default_value = "phantom.log")]
    pub log_file: PathBuf,
}
