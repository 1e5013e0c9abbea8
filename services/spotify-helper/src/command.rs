//! Command-line parsing
//!
//! Commands are chained left to right and separated by a lone `-`:
//!
//! ```text
//! spotify-helper fetch-my-tracks --limit 100 - filter-by-genre jazz --save jazz - print jazz --pretty
//! ```
//!
//! Each segment is parsed on its own. `--config PATH` is accepted in any
//! segment and the last one given wins.

use clap::{Parser, Subcommand};

use crate::error::Result;

/// Result slot used when a command is not given `--save` / `--load`
pub const DEFAULT_SLOT: &str = "__default__";

const BIN_NAME: &str = "spotify-helper";

/// Query a Spotify library and print the results as JSON
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, arg_required_else_help = true)]
#[command(after_help = "Chain commands with a lone `-`, e.g.\n  \
    spotify-helper fetch-my-tracks - filter-by-genre jazz - print --pretty")]
struct Cli {
    /// Configuration file (defaults to CONFIG_PATH, then ./spotify-helper.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Saved tracks of the current user
    #[command(alias = "fetch_my_tracks")]
    FetchMyTracks {
        /// Stop after this many tracks
        #[arg(long)]
        limit: Option<usize>,
        /// Slot to store the result in
        #[arg(long, default_value = DEFAULT_SLOT)]
        save: String,
    },

    /// Tracks matching a genre
    #[command(alias = "search_by_genre")]
    SearchByGenre {
        genre: String,
        #[arg(long, default_value = DEFAULT_SLOT)]
        save: String,
    },

    /// Keep loaded tracks that match a genre
    #[command(alias = "filter_by_genre")]
    FilterByGenre {
        genre: String,
        /// Slot to read tracks from
        #[arg(long, default_value = DEFAULT_SLOT)]
        load: String,
        #[arg(long, default_value = DEFAULT_SLOT)]
        save: String,
    },

    /// Copy the default result to NAME
    Save { name: String },

    /// Write saved results as JSON (all of them without NAME)
    Print {
        name: Option<String>,
        #[arg(long)]
        pretty: bool,
    },
}

/// Parsed command line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    pub config: Option<String>,
    pub commands: Vec<Command>,
}

/// Parse the arguments after the program name.
///
/// Help and version requests come back as `Error::Cli` so the caller can
/// let clap render them.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Invocation> {
    let words: Vec<String> = args.into_iter().collect();
    let mut segments: Vec<&[String]> = words
        .split(|w| w == "-")
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        // clap prints the help for an empty command line
        segments.push(&[]);
    }

    let mut invocation = Invocation::default();
    for segment in segments {
        let cli = Cli::try_parse_from(
            std::iter::once(BIN_NAME).chain(segment.iter().map(String::as_str)),
        )?;
        if cli.config.is_some() {
            invocation.config = cli.config;
        }
        invocation.commands.push(cli.command);
    }
    Ok(invocation)
}
