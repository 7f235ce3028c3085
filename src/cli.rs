use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::posts::Source;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to a YAML config file (thresholds, model, stop phrases)
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Semantic pipeline: dedup the Telegram corpus, then match Habr
    /// against Telegram (and optionally Pikabu) via embeddings
    Run {
        /// Habr scraper dump (JSON)
        #[clap(long)]
        habr: PathBuf,

        /// Telegram scraper dump (JSON)
        #[clap(long)]
        telegram: PathBuf,

        /// Pikabu scraper dump (JSON), optional second counterpart set
        #[clap(long)]
        pikabu: Option<PathBuf>,

        /// Where to write the JSON report
        #[clap(short, long, default_value = "report.json")]
        out: PathBuf,

        /// Also export CSV tables into this directory
        #[clap(long)]
        csv_dir: Option<PathBuf>,
    },

    /// Lexical pipeline: n-gram / IDF matching between two dumps
    Lexical {
        /// Habr scraper dump (JSON)
        #[clap(long)]
        habr: PathBuf,

        /// Telegram scraper dump (JSON)
        #[clap(long)]
        telegram: PathBuf,

        /// Where to write the JSON report
        #[clap(short, long, default_value = "report.json")]
        out: PathBuf,

        /// Also export CSV tables into this directory
        #[clap(long)]
        csv_dir: Option<PathBuf>,
    },

    /// Collapse near-duplicates within a single dump
    Dedup {
        /// Which platform the dump came from
        #[clap(long, value_enum)]
        source: Source,

        /// Scraper dump (JSON)
        #[clap(long)]
        input: PathBuf,

        /// Where to write the surviving posts (JSON)
        #[clap(short, long, default_value = "deduped.json")]
        out: PathBuf,
    },
}
