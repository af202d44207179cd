use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use voxsplice::{
    alignment_words, merge_short_words, pack_clips, parse_transcript_file, process_batch,
    AlignerClient, AlignerConfig, AudioBuffer, ManifestWriter, MergeConfig, Orchestrator,
    OrchestratorConfig, PackConfig,
};

#[derive(Parser)]
#[command(name = "voxsplice")]
#[command(author, version, about = "Transcript-aligned audio segmentation pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a batch of recordings into fixed-duration clips
    Process {
        /// Input directory containing source recordings (mono 16-bit PCM WAV)
        #[arg(short, long)]
        input: PathBuf,

        /// Transcript manifest: one `file-name<TAB>transcript` line per recording
        #[arg(short, long)]
        transcripts: PathBuf,

        /// Output root; each accepted recording gets its own clip directory
        #[arg(short, long)]
        output: PathBuf,

        /// Base URL of the alignment service (defaults to GENTLE_URL or localhost)
        #[arg(long)]
        aligner_url: Option<String>,

        /// Minimum spoken duration for a standalone merged token in seconds
        #[arg(long, default_value = "0.2")]
        min_word_duration: f64,

        /// Minimum clip duration in seconds
        #[arg(long, default_value = "1.5")]
        min_clip_duration: f64,

        /// Target maximum clip duration in seconds
        #[arg(long, default_value = "3.0")]
        max_clip_duration: f64,

        /// Maximum recordings processed concurrently
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Process at most this many recordings
        #[arg(long)]
        limit: Option<usize>,

        /// Skip writing the run manifest
        #[arg(long)]
        no_manifest: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Align one recording and report its segmentation plan without writing clips
    Analyze {
        /// Audio file to analyze (mono 16-bit PCM WAV)
        #[arg(short, long)]
        input: PathBuf,

        /// Transcript text to align against
        #[arg(short, long)]
        transcript: String,

        /// Base URL of the alignment service (defaults to GENTLE_URL or localhost)
        #[arg(long)]
        aligner_url: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            transcripts,
            output,
            aligner_url,
            min_word_duration,
            min_clip_duration,
            max_clip_duration,
            concurrency,
            limit,
            no_manifest,
            verbose,
        } => {
            setup_logging(verbose);
            run_process(
                input,
                transcripts,
                output,
                aligner_url,
                min_word_duration,
                min_clip_duration,
                max_clip_duration,
                concurrency,
                limit,
                no_manifest,
            )
            .await
        }
        Commands::Analyze {
            input,
            transcript,
            aligner_url,
            verbose,
        } => {
            setup_logging(verbose);
            run_analyze(input, transcript, aligner_url).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn aligner_client(aligner_url: Option<String>) -> Result<AlignerClient> {
    let config = match aligner_url {
        Some(url) => AlignerConfig::new(url),
        None => AlignerConfig::from_env(),
    };
    AlignerClient::new(config).context("Failed to create aligner client")
}

async fn run_process(
    input: PathBuf,
    transcripts: PathBuf,
    output: PathBuf,
    aligner_url: Option<String>,
    min_word_duration: f64,
    min_clip_duration: f64,
    max_clip_duration: f64,
    concurrency: usize,
    limit: Option<usize>,
    no_manifest: bool,
) -> Result<()> {
    let start = Instant::now();

    info!("Loading transcript manifest from {:?}", transcripts);
    let mut entries =
        parse_transcript_file(&transcripts).context("Failed to parse transcript manifest")?;
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    info!("Loaded {} recording(s)", entries.len());

    // Anything wrong with the shared output structure is fatal for the
    // whole run, unlike per-recording failures
    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create output directory {:?}", output))?;

    let client = aligner_client(aligner_url)?;
    let config = OrchestratorConfig {
        merge: MergeConfig { min_word_duration },
        pack: PackConfig {
            min_clip_duration,
            max_clip_duration,
            min_source_duration: min_clip_duration,
        },
        output_dir: output.clone(),
    };

    let mut orchestrator = Orchestrator::new(client, config);
    if !no_manifest {
        let manifest_path = output.join("manifest.jsonl");
        let manifest = ManifestWriter::create(&manifest_path)
            .with_context(|| format!("Failed to create run manifest {:?}", manifest_path))?;
        info!("Run {} writing manifest to {:?}", manifest.run_id(), manifest_path);
        orchestrator = orchestrator.with_manifest(manifest);
    }

    let stats = process_batch(Arc::new(orchestrator), entries, &input, concurrency).await;

    info!(
        "Complete: {} processed, {} materialized ({} clips), {} skipped, {} failed, {} missing in {:.2}s",
        stats.recordings_processed,
        stats.materialized,
        stats.clips_written,
        stats.skipped_no_segments,
        stats.failed,
        stats.missing_inputs,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

async fn run_analyze(input: PathBuf, transcript: String, aligner_url: Option<String>) -> Result<()> {
    info!("Analyzing recording {:?}", input);

    let audio = AudioBuffer::from_wav_file(&input).context("Failed to decode input audio")?;
    let client = aligner_client(aligner_url)?;
    let response = client
        .align(&input, &transcript)
        .await
        .context("Alignment request failed")?;

    println!("Alignment");
    println!("=========");
    println!("Duration: {:.2}s", audio.duration_seconds());
    println!("Words: {}", response.words.len());
    println!(
        "Aligned: {} ({:.0}%)",
        response.aligned_count(),
        response.aligned_fraction() * 100.0
    );
    for word in response.words.iter().filter(|w| !w.is_success()) {
        println!("  not aligned: {:?} ({})", word.word, word.case);
    }
    println!();

    let words = alignment_words(&response.words)
        .context("Aligner returned inconsistent word timestamps")?;
    let tokens = merge_short_words(&words, &MergeConfig::default());
    println!("Merged tokens");
    println!("-------------");
    println!("Tokens: {}", tokens.len());
    for token in &tokens {
        println!(
            "  {:>6.2}s-{:>6.2}s ({:.2}s) {}",
            token.start,
            token.end,
            token.duration(),
            token.text
        );
    }
    println!();

    let clips = pack_clips(&tokens, audio.duration_seconds(), &PackConfig::default());
    println!("Clip plan");
    println!("---------");
    if clips.is_empty() {
        println!("No viable clips; this recording would be skipped");
        return Ok(());
    }
    for clip in &clips {
        println!(
            "  {} {:>6.2}s-{:>6.2}s ({:.2}s packed)",
            clip.file_name(),
            clip.start,
            clip.end,
            clip.packed_duration()
        );
    }

    Ok(())
}
