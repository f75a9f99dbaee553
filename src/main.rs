use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{error, info, LevelFilter};
use topicprep::pipeline::{InputFormat, SplitMode};
use topicprep::tokenize::Language;
use topicprep::{ArtifactPaths, FeatureFilter, Mode, PipelineConfig, Preprocessor, Visualization};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[clap(short, long, action = ArgAction::Count, global = true, help = "Increase log verbosity (-v info, -vv debug)")]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Turn a folder of documents into corpus, dictionary and label files.
    Preprocess {
        input_dir: PathBuf,
        output_dir: PathBuf,
        #[clap(long, default_value = "txt", help = "Document extension; csv or tsv reads annotation tables")]
        ext: String,
        #[clap(short, long, default_value_t = Language::German)]
        language: Language,
        #[clap(long, value_enum, default_value_t = SplitterArg::Whitespace)]
        splitter: SplitterArg,
        #[clap(long, help = "Remove this many most frequent terms")]
        mfw: Option<usize>,
        #[clap(long, default_value_t = true, action = ArgAction::Set, help = "Remove terms occurring exactly once")]
        hapax: bool,
        #[clap(long, value_enum, default_value_t = FilterOrder::StopwordsFirst)]
        filter_order: FilterOrder,
        #[clap(long = "pos-tag", help = "POS tags kept from annotation tables (repeatable)")]
        pos_tags: Vec<String>,
        #[clap(long)]
        segment_length: Option<usize>,
    },
    /// Render a document x topic heatmap.
    Heatmap {
        model: PathBuf,
        corpus: PathBuf,
        labels: PathBuf,
        output_dir: PathBuf,
        #[clap(long, default_value = "heatmap")]
        filename: String,
        #[clap(long, default_value = "png")]
        ext: String,
        #[clap(long, default_value_t = 200)]
        dpi: u32,
    },
    /// Write the interactive HTML page and its JSON data.
    Interactive {
        model: PathBuf,
        corpus: PathBuf,
        dictionary: PathBuf,
        output_dir: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SplitterArg {
    Whitespace,
    Tokenizer,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FilterOrder {
    StopwordsFirst,
    HapaxFirst,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {} {}: {}",
                chrono::Local::now().format("%d-%b-%Y %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn filters(mfw: Option<usize>, hapax: bool, order: FilterOrder) -> Vec<FeatureFilter> {
    let stopwords = mfw.map(FeatureFilter::Stopwords);
    let hapax = hapax.then_some(FeatureFilter::Hapax);
    match order {
        FilterOrder::StopwordsFirst => stopwords.into_iter().chain(hapax).collect(),
        FilterOrder::HapaxFirst => hapax.into_iter().chain(stopwords).collect(),
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Preprocess {
            input_dir,
            output_dir,
            ext,
            language,
            splitter,
            mfw,
            hapax,
            filter_order,
            pos_tags,
            segment_length,
        } => {
            let defaults = PipelineConfig::default();
            let format = match ext.to_lowercase().as_str() {
                "csv" | "tsv" => InputFormat::Annotated,
                _ => InputFormat::Text,
            };
            let config = PipelineConfig {
                format,
                extension: ext,
                language,
                split: match splitter {
                    SplitterArg::Whitespace => SplitMode::Whitespace,
                    SplitterArg::Tokenizer => SplitMode::Pattern,
                },
                pos_tags: if pos_tags.is_empty() { defaults.pos_tags } else { pos_tags },
                filters: filters(mfw, hapax, filter_order),
                segment_length,
            };

            let preprocessor = Preprocessor::new(config)?;
            let output = preprocessor
                .run(&input_dir)
                .with_context(|| format!("preprocessing {}", input_dir.display()))?;
            for (filter, count) in &output.removed {
                info!("{filter:?} removed {count} terms.");
            }
            output
                .save(&output_dir)
                .with_context(|| format!("writing artifacts to {}", output_dir.display()))?;
            println!(
                "{} documents, {} terms written to {}",
                output.matrix.n_documents(),
                output.matrix.n_terms(),
                output_dir.display()
            );
        }
        Command::Heatmap {
            model,
            corpus,
            labels,
            output_dir,
            filename,
            ext,
            dpi,
        } => {
            let paths = ArtifactPaths {
                model,
                corpus,
                doc_labels: Some(labels),
                dictionary: None,
            };
            let mut vis = Visualization::load(&paths, Mode::Heatmap)?;
            vis.make_heatmap()?;
            ensure_dir(&output_dir)?;
            let path = vis.save_heatmap(&output_dir, &filename, &ext, dpi)?;
            println!("Heatmap written to {}", path.display());
        }
        Command::Interactive {
            model,
            corpus,
            dictionary,
            output_dir,
        } => {
            let paths = ArtifactPaths {
                model,
                corpus,
                doc_labels: None,
                dictionary: Some(dictionary),
            };
            let mut vis = Visualization::load(&paths, Mode::Interactive)?;
            vis.make_interactive()?;
            ensure_dir(&output_dir)?;
            let (html, json) = vis.save_interactive(&output_dir)?;
            println!("Interactive visualization written to {} and {}", html.display(), json.display());
        }
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
