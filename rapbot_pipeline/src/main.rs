// CLI entry point for rapbot.
//
// Learns a corpus of MeCab-format tokenizer output, waits until the model
// has filled its generation window, prints lyrics, and optionally answers
// reply seeds. Lyrics go to stdout; logs go to stderr (`RUST_LOG` filters
// them, default `info` for the workspace crates). The pipeline is stopped
// on every exit path, including errors while reading input.
//
// Usage:
//   mecab < corpus.txt | rapbot [OPTIONS]
//     --config <PATH>         JSON config (default: built-in defaults)
//     --corpus <PATH>         MeCab output to learn, `-` for stdin (default: -)
//     --lyrics <N>            Lyrics to print (default: 1)
//     --replies <PATH>        MeCab output; each sentence is a reply seed
//     --timeout-secs <N>      Readiness and per-lyric timeout (default: 30)

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rapbot_lang::{MecabSentences, Phrase, parse_mecab_str};
use rapbot_pipeline::{PipelineHandle, RapbotConfig, start_pipeline};

/// Shown when there is nothing to reply with yet.
const NOT_READY_REPLY: &str = "準備中です(｀･ω･´)";

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str =
    "rapbot=info,rapbot_lang=info,rapbot_markov=info,rapbot_rapper=info,rapbot_pipeline=info";

#[derive(Parser, Debug)]
#[command(name = "rapbot", about = "Generates rhyming Japanese lyrics from a learned corpus")]
struct Args {
    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// MeCab-format corpus to learn, `-` for stdin.
    #[arg(long, default_value = "-")]
    corpus: String,

    /// Number of lyrics to print.
    #[arg(long, default_value_t = 1)]
    lyrics: usize,

    /// MeCab-format reply seeds, one sentence per seed.
    #[arg(long)]
    replies: Option<PathBuf>,

    /// Seconds to wait for readiness and for each lyric.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RapbotConfig::load(path)?,
        None => RapbotConfig::default(),
    };

    let handle = start_pipeline(config)?;
    let result = run(&handle, &args);
    handle.stop();
    result
}

fn run(handle: &PipelineHandle, args: &Args) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(args.timeout_secs);

    let reader: Box<dyn BufRead> = if args.corpus == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.corpus)
            .with_context(|| format!("failed to open corpus {}", args.corpus))?;
        Box::new(BufReader::new(file))
    };
    let mut queued = 0usize;
    for sentence in MecabSentences::new(reader) {
        if !handle.learn_sentence(sentence?) {
            break;
        }
        queued += 1;
    }
    info!(sentences = queued, "corpus queued for learning");

    if !handle.wait_ready_timeout(timeout) {
        warn!("model not ready; the corpus may be smaller than the generation window");
    }

    for i in 0..args.lyrics {
        let Some(lyric) = handle.next_lyric_timeout(timeout) else {
            warn!(printed = i, "timed out waiting for a lyric");
            break;
        };
        if i > 0 {
            println!();
        }
        println!("{lyric}");
    }

    if let Some(path) = &args.replies {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read reply seeds {}", path.display()))?;
        for seed in parse_mecab_str(&text)? {
            let seed: Phrase = seed.into_iter().collect();
            println!();
            println!("> {seed}");
            match handle.reply(&seed) {
                Some(lyric) => println!("{lyric}"),
                None => println!("{NOT_READY_REPLY}"),
            }
        }
    }
    Ok(())
}
