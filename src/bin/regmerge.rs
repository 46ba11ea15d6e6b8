//! Registration descriptor merging from the command line.
//!
//! `regmerge merge` renumbers descriptor fragments of one kind;
//! `regmerge assemble` lays module directories out into one output directory
//! with their registration descriptors merged.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use regmerge::archive::{read_module_dir, ArchiveAssembler, DirectoryArchive};
use regmerge::core::{merge_fragments, Kind, LineSeparator, RegistrationMerger, RegistrationPaths};

#[derive(Parser)]
#[command(name = "regmerge")]
#[command(about = "Merge per-module registration descriptors into one archive")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); defaults to RUST_LOG
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Line separator of merged descriptors
    #[arg(long, value_enum, default_value_t = Separator::Platform, global = true)]
    line_separator: Separator,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge descriptor fragments of one kind, in argument order
    Merge {
        /// Kind name, e.g. language
        #[arg(short, long)]
        kind: String,

        /// Output file (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Descriptor fragments
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Assemble module directories into one output directory
    Assemble {
        /// Output archive directory (created if missing, must be empty)
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Output directory of the sources archive (created if missing, must be empty)
        #[arg(long, value_name = "DIR")]
        sources_output: Option<PathBuf>,

        /// Module source directory (repeatable)
        #[arg(long = "source-dir", value_name = "DIR")]
        source_dirs: Vec<PathBuf>,

        /// Registration kind as NAME=PATH (repeatable, replaces the Truffle defaults)
        #[arg(long = "kind", value_name = "NAME=PATH")]
        kinds: Vec<String>,

        /// Module output directories, offered in argument order
        #[arg(value_name = "MODULE_DIR", required = true)]
        modules: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Separator {
    Platform,
    Lf,
    Crlf,
}

impl From<Separator> for LineSeparator {
    fn from(sep: Separator) -> Self {
        match sep {
            Separator::Platform => LineSeparator::Platform,
            Separator::Lf => LineSeparator::Lf,
            Separator::Crlf => LineSeparator::CrLf,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let separator = LineSeparator::from(cli.line_separator);
    match cli.command {
        Commands::Merge { kind, output, inputs } => cmd_merge(&kind, output.as_deref(), &inputs, separator),
        Commands::Assemble {
            output,
            sources_output,
            source_dirs,
            kinds,
            modules,
        } => cmd_assemble(
            &output,
            sources_output.as_deref(),
            &source_dirs,
            &kinds,
            &modules,
            separator,
        ),
    }
}

fn cmd_merge(
    kind: &str,
    output: Option<&Path>,
    inputs: &[PathBuf],
    separator: LineSeparator,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = RegistrationPaths::truffle();
    let kind = match paths.kinds().iter().find(|k| k.name() == kind) {
        Some(known) => known.clone(),
        None => Kind::new(kind, format!("META-INF/truffle/{kind}"))?,
    };

    let fragments = inputs
        .iter()
        .map(|path| fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e)))
        .collect::<Result<Vec<_>, _>>()?;
    let merged = merge_fragments(&kind, &fragments, separator)?;

    match output {
        Some(path) => fs::write(path, merged)?,
        None => io::stdout().write_all(merged.as_bytes())?,
    }
    Ok(())
}

fn cmd_assemble(
    output: &Path,
    sources_output: Option<&Path>,
    source_dirs: &[PathBuf],
    kinds: &[String],
    modules: &[PathBuf],
    separator: LineSeparator,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = if kinds.is_empty() {
        RegistrationPaths::truffle()
    } else {
        let kinds = kinds
            .iter()
            .map(|spec| Kind::parse_assignment(spec))
            .collect::<Result<Vec<_>, _>>()?;
        RegistrationPaths::new(kinds)?
    };

    let name = output.display().to_string();
    let merger = RegistrationMerger::new(paths).with_separator(separator);
    let mut archive = DirectoryArchive::create(output)?;
    let mut sources = sources_output.map(DirectoryArchive::create).transpose()?;

    let mut asm = ArchiveAssembler::new(merger, &name, &mut archive)?;
    if let Some(sources) = sources.as_mut() {
        asm = asm.with_sources(sources);
    }

    for module in modules {
        asm.add_module(&read_module_dir(module)?)?;
    }
    for dir in source_dirs {
        for entry in read_module_dir(dir)? {
            asm.add_source_entry(&entry.path, &entry.contents)?;
        }
    }

    let stats = asm.finish()?;
    println!(
        "{}: {} entries copied, {} descriptors merged into {}, {} overlaps skipped",
        name, stats.entries_copied, stats.entries_consumed, stats.entries_emitted, stats.overlaps_skipped
    );
    if sources_output.is_some() {
        println!(
            "{}: {} source entries copied, {} source overlaps skipped",
            name, stats.sources_copied, stats.source_overlaps_skipped
        );
    }
    Ok(())
}
