use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

mod cli;
mod config;
mod lexical;
mod posts;
mod report;
mod semantic;
#[cfg(test)]
mod tests;

use config::Config;
use lexical::{match_corpora, IdfTable, LexicalParams};
use posts::{Corpus, Source};
use report::{aggregate, MatchReport};
use semantic::{dedup_posts, match_across, EmbeddingCache, FastembedProvider};

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();
    let config = Config::load(args.config.as_deref())?;

    match args.command {
        cli::Command::Run {
            habr,
            telegram,
            pikabu,
            out,
            csv_dir,
        } => run_semantic(&config, &habr, &telegram, pikabu.as_deref(), &out, csv_dir.as_deref()),

        cli::Command::Lexical {
            habr,
            telegram,
            out,
            csv_dir,
        } => run_lexical(&config, &habr, &telegram, &out, csv_dir.as_deref()),

        cli::Command::Dedup { source, input, out } => run_dedup(&config, source, &input, &out),
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Semantic pipeline: embed everything once, collapse Telegram duplicates,
/// then match Habr against the deduped Telegram corpus (and Pikabu when
/// provided) with greedy one-to-one assignment.
fn run_semantic(
    config: &Config,
    habr_path: &Path,
    telegram_path: &Path,
    pikabu_path: Option<&Path>,
    out: &Path,
    csv_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let habr = Corpus::load(Source::Habr, habr_path)
        .with_context(|| format!("loading {}", habr_path.display()))?;
    let telegram = Corpus::load(Source::Telegram, telegram_path)
        .with_context(|| format!("loading {}", telegram_path.display()))?;
    let pikabu = pikabu_path
        .map(|path| {
            Corpus::load(Source::Pikabu, path).with_context(|| format!("loading {}", path.display()))
        })
        .transpose()?;

    let provider = FastembedProvider::new(
        &config.semantic.model,
        PathBuf::from(&config.semantic.model_cache_dir),
    )?;
    log::info!("embedding model: {}", provider.name());
    let mut cache = EmbeddingCache::new(config.semantic.batch_size);

    cache.ensure(&provider, Source::Telegram, &telegram.posts)?;
    let telegram = Corpus::new(
        Source::Telegram,
        dedup_posts(
            &telegram.posts,
            Source::Telegram,
            config.semantic.duplicate_threshold,
            &cache,
        )?,
    );

    cache.ensure(&provider, Source::Habr, &habr.posts)?;
    if let Some(pikabu) = &pikabu {
        cache.ensure(&provider, Source::Pikabu, &pikabu.posts)?;
    }

    let mut counterparts: Vec<&Corpus> = vec![&telegram];
    if let Some(pikabu) = &pikabu {
        counterparts.push(pikabu);
    }

    let outcome = match_across(&habr, &counterparts, config.semantic.match_threshold, &cache)?;

    let mut corpora: Vec<&Corpus> = vec![&habr, &telegram];
    if let Some(pikabu) = &pikabu {
        corpora.push(pikabu);
    }
    let report = aggregate(&corpora, &outcome.matches);

    write_report(&report, out, csv_dir)
}

/// Lexical pipeline: IDF weights over the union of both corpora, then
/// n-gram overlap matching.
fn run_lexical(
    config: &Config,
    habr_path: &Path,
    telegram_path: &Path,
    out: &Path,
    csv_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let habr = Corpus::load(Source::Habr, habr_path)
        .with_context(|| format!("loading {}", habr_path.display()))?;
    let telegram = Corpus::load(Source::Telegram, telegram_path)
        .with_context(|| format!("loading {}", telegram_path.display()))?;

    let params = LexicalParams {
        window: config.lexical.window,
        absolute_threshold: config.lexical.absolute_threshold,
        relative_threshold: config.lexical.relative_threshold,
        stop_phrases: config.lexical.stop_phrase_set(),
    };

    let idf = IdfTable::compute(
        habr.posts.iter().chain(&telegram.posts),
        params.window,
        &params.stop_phrases,
    )?;

    let records = match_corpora(&habr, &telegram, &idf, &params)?;
    let report = aggregate(&[&habr, &telegram], &records);

    write_report(&report, out, csv_dir)
}

/// Collapse near-duplicates within one dump and write the survivors.
fn run_dedup(config: &Config, source: Source, input: &Path, out: &Path) -> anyhow::Result<()> {
    let corpus = Corpus::load(source, input)
        .with_context(|| format!("loading {}", input.display()))?;

    let provider = FastembedProvider::new(
        &config.semantic.model,
        PathBuf::from(&config.semantic.model_cache_dir),
    )?;
    let mut cache = EmbeddingCache::new(config.semantic.batch_size);
    cache.ensure(&provider, source, &corpus.posts)?;

    let survivors = dedup_posts(
        &corpus.posts,
        source,
        config.semantic.duplicate_threshold,
        &cache,
    )?;

    let dump = serde_json::json!({
        "metadata": {
            "generated_at": chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
            "posts_count": survivors.len(),
        },
        "posts": survivors,
    });
    std::fs::write(out, serde_json::to_string_pretty(&dump)?)?;
    log::info!("deduped dump written to {}", out.display());

    Ok(())
}

fn write_report(report: &MatchReport, out: &Path, csv_dir: Option<&Path>) -> anyhow::Result<()> {
    report.write_json(out)?;
    if let Some(dir) = csv_dir {
        report.write_csv(dir)?;
    }

    println!(
        "{} matched pairs, unmatched: {}",
        report.matches.len(),
        report
            .unmatched
            .iter()
            .map(|set| format!("{} {}", set.posts.len(), set.source))
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}
