use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pyqbot")]
#[command(author, version, about = "Telegram bot for previous-year-question quizzes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,
    },

    /// Apply database migrations and exit
    Migrate,

    /// Print the number of stored questions
    Stats,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["pyqbot"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_run_with_webhook_flag() {
        let cli = Cli::try_parse_from(["pyqbot", "run", "--webhook"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Run { webhook: true }));
    }

    #[test]
    fn test_maintenance_subcommands() {
        assert_eq!(
            Cli::try_parse_from(["pyqbot", "migrate"]).unwrap().command,
            Some(Commands::Migrate)
        );
        assert_eq!(
            Cli::try_parse_from(["pyqbot", "stats"]).unwrap().command,
            Some(Commands::Stats)
        );
    }
}
