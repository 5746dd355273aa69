use std::path::PathBuf;

use clap::{
    ArgAction,
    Parser,
    Subcommand,
};

#[derive(Parser)]
#[command(
    name = "anki-ai-translator",
    version,
    about = "Translate Anki note fields with an LLM",
    long_about = "Fills the target fields of Anki notes with LLM translations of their \
                  source fields.\n\nTalks to Anki through the AnkiConnect add-on; the \
                  provider key is read from the environment variable named in the config."
)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// AnkiConnect URL, overrides `anki_connect_url` for this invocation
    #[arg(long, global = true, value_name = "URL")]
    pub anki_url: Option<String>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Translate every eligible note matching a search query")]
    Translate {
        /// Anki search query, defaults to `batch_query_default`
        query: Option<String>,
    },

    #[command(about = "Translate the note behind the card shown in the reviewer")]
    Current,

    #[command(about = "Check that AnkiConnect is reachable")]
    Check,

    #[command(subcommand, about = "Show or edit the configuration")]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Print the effective configuration")]
    Show,

    #[command(about = "Print the config file location")]
    Path,

    #[command(about = "Delete the config file so defaults apply again")]
    Reset,

    #[command(about = "Set one key, e.g. `config set target_language German`")]
    Set { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "anki-ai-translator",
            "translate",
            "deck:Spanish",
            "--anki-url",
            "http://127.0.0.1:9999",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.anki_url.as_deref(), Some("http://127.0.0.1:9999"));
        assert!(matches!(cli.command, Commands::Translate { query: Some(q) } if q == "deck:Spanish"));
    }

    #[test]
    fn config_set_takes_key_and_value() {
        let cli =
            Cli::try_parse_from(["anki-ai-translator", "config", "set", "temperature", "0.3"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommand::Set { key, value }) if key == "temperature" && value == "0.3"
        ));
    }
}
