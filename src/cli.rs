use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "family-hub", version, about = "Family calendar in the terminal")]
pub struct Cli {
    /// Backend base URL (overrides config and FAMILY_HUB_API_BASE_URL)
    #[arg(long, value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Path to config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Less log output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Log to stderr instead of the log file
    #[arg(long)]
    pub log_stderr: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from([
            "family-hub",
            "--api-base-url",
            "http://10.0.0.201:8000",
            "-vv",
            "--log-stderr",
        ]);
        assert_eq!(cli.api_base_url.as_deref(), Some("http://10.0.0.201:8000"));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.quiet, 0);
        assert!(cli.log_stderr);
        assert!(cli.config.is_none());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
