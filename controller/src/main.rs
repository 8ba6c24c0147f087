mod bus;
mod host;
mod lock;
mod notify;
mod spool;

use std::path::PathBuf;

use clap::Parser;

/// Drive a Honeywell Chronotherm through its keypad.
///
/// With command words (`heat on 18 25-12 07:30`) a single command is executed
/// and the process exits. Without them the spool directory is polled for
/// emailed commands until SIGINT or SIGTERM.
#[derive(Parser, Debug)]
#[command(name = "heat", author, version, about, long_about = None)]
pub struct Cli {
    /// Command to run once, e.g. `heat off 15`.
    #[arg(value_name = "WORD")]
    pub command: Vec<String>,
    /// Seconds between spool checks.
    #[arg(short, long, env = "HEAT_POLL_SECS", value_name = "SECS")]
    pub timeout: Option<u64>,
    /// Report every outcome through the configured notifier.
    #[arg(short = 'e', long)]
    pub sendmail: bool,
    /// Spool directory to read emailed commands from.
    #[arg(long, value_name = "DIR")]
    pub spool: Option<PathBuf>,
    /// JSON runtime configuration.
    #[arg(long, env = "CHRONOTHERM_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run(Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn command_words_are_collected_in_order() {
        let cli = Cli::try_parse_from(["heat", "heat", "on", "18", "25-12", "07:30"]).unwrap();

        assert_eq!(cli.command, vec!["heat", "on", "18", "25-12", "07:30"]);
        assert_eq!(cli.timeout, None);
        assert!(!cli.sendmail);
    }

    #[test]
    fn daemon_flags_parse() {
        let cli = Cli::try_parse_from(["heat", "--timeout", "60", "--sendmail"]).unwrap();

        assert!(cli.command.is_empty());
        assert_eq!(cli.timeout, Some(60));
        assert!(cli.sendmail);
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["heat", "-t", "soon"]).is_err());
    }
}
