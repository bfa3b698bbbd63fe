use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use vdjgen::shared::config::{
    parse_conserved_residues, parse_count, GenerationMode, ModelChoice, DEFAULT_MODELS_ROOT,
};
use vdjgen::shared::output::{default_delimiter, parse_delimiter, OutputSettings, SeqType};
use vdjgen::shared::selection::{FEATURES_FILE, LOG_FILE};
use vdjgen::shared::{LogProgress, ProgressObserver};
use vdjgen::{GenerationParameters, Generator, Model, SelectionModel, SoniaModel};

/// Generate CDR3 sequences from a V(D)J recombination model, before (pgen)
/// or after (ppost) thymic selection.
#[derive(Parser, Debug)]
#[command(name = "vdjgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Human T cell alpha chain model
    #[arg(long = "humanTRA")]
    human_tra: bool,

    /// Human T cell beta chain model
    #[arg(long = "humanTRB")]
    human_trb: bool,

    /// Mouse T cell beta chain model
    #[arg(long = "mouseTRB")]
    mouse_trb: bool,

    /// Human B cell heavy chain model
    #[arg(long = "humanIGH")]
    human_igh: bool,

    /// Folder of a custom VJ model
    #[arg(long = "set-custom-model-vj", value_name = "DIR")]
    custom_model_vj: Option<PathBuf>,

    /// Folder of a custom VDJ model
    #[arg(long = "set-custom-model-vdj", value_name = "DIR")]
    custom_model_vdj: Option<PathBuf>,

    /// Folder containing the built-in models
    #[arg(long, default_value = DEFAULT_MODELS_ROOT)]
    models_root: PathBuf,

    /// Generate sequences from the generation model alone
    #[arg(long, visible_alias = "pgen")]
    pre: bool,

    /// Generate sequences after selection
    #[arg(long, visible_alias = "ppost")]
    post: bool,

    /// Number of sequences to generate (scientific notation accepted, e.g. 2e4)
    #[arg(short = 'n', long, value_parser = parse_count)]
    num_seqs: usize,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// Seed of the random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// Sequences to record: all, ntseq, nucleotide, aaseq, amino_acid
    #[arg(long, default_value = "all")]
    seq_type: SeqType,

    /// Do not record the V and J genes
    #[arg(long)]
    record_genes_off: bool,

    /// Delimiter: tab, space, ',', ';' or ':' (default: tab, ',' for .csv files)
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Use the delimiter as given (any single character)
    #[arg(long)]
    raw_delimiter: bool,

    /// Residues accepted at the end of a productive CDR3
    #[arg(long, default_value = "FVW")]
    conserved_j_residues: String,

    /// Number of draws between two time updates
    #[arg(long, default_value = "100000")]
    seqs_per_time_update: usize,

    /// Do not print time updates
    #[arg(long)]
    time_updates_off: bool,

    /// Maximal number of consecutive draws without a new sequence
    #[arg(long, default_value = "1000000")]
    max_attempts: usize,

    /// Initial bound of the rejection sampling (post-selection)
    #[arg(long, default_value = "10")]
    acceptance_bound: f64,

    /// Number of threads to use in parallel mode
    ///
    /// If not specified, defaults to the number of logical CPUs.
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Draw the recombination events on several threads
    #[arg(long)]
    parallel: bool,

    /// Selection model features (default: features.tsv in the model folder)
    #[arg(long)]
    features_file: Option<PathBuf>,

    /// Selection model log with the normalization (default: log.txt in the model folder)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn model_choice(&self) -> ModelChoice {
        let builtin = [
            (self.human_tra, "humanTRA"),
            (self.human_trb, "humanTRB"),
            (self.mouse_trb, "mouseTRB"),
            (self.human_igh, "humanIGH"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();
        ModelChoice {
            builtin,
            custom_vj: self.custom_model_vj.clone(),
            custom_vdj: self.custom_model_vdj.clone(),
        }
    }

    fn output_settings(&self) -> Result<OutputSettings> {
        let delimiter = match &self.delimiter {
            Some(d) => parse_delimiter(d, self.raw_delimiter)?,
            None => default_delimiter(self.outfile.as_deref()),
        };
        Ok(OutputSettings {
            seq_type: self.seq_type,
            record_genes: !self.record_genes_off,
            delimiter,
        })
    }

    fn generation_parameters(&self) -> Result<GenerationParameters> {
        Ok(GenerationParameters {
            conserved_j_residues: parse_conserved_residues(&self.conserved_j_residues)?,
            max_attempts_per_sequence: self.max_attempts.max(1),
            initial_acceptance_bound: self.acceptance_bound,
            progress_every: self.seqs_per_time_update.max(1),
            parallel: self.parallel,
            ..Default::default()
        })
    }
}

fn progress_observer() -> Box<dyn ProgressObserver> {
    #[cfg(feature = "kdam")]
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        return Box::new(vdjgen::shared::BarProgress::new());
    }
    Box::new(LogProgress::new())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    // everything is checked before loading anything
    let source = cli.model_choice().resolve(&cli.models_root)?;
    let mode = GenerationMode::resolve(cli.pre, cli.post)?;
    let output = cli.output_settings()?;
    let params = cli.generation_parameters()?;
    if !(cli.acceptance_bound.is_finite() && cli.acceptance_bound > 0.) {
        return Err(vdjgen::Error::Configuration(
            "The acceptance bound should be a positive number".to_string(),
        )
        .into());
    }

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to build the thread pool")?;
    }

    info!("Loading {} from {}", source.name, source.directory.display());
    let model = Model::load_from_directory(&source.directory, source.recombination)?;

    let selection = match mode {
        GenerationMode::Pre => None,
        GenerationMode::Post => {
            let features = cli
                .features_file
                .clone()
                .unwrap_or_else(|| source.directory.join(FEATURES_FILE));
            let log = cli
                .log_file
                .clone()
                .unwrap_or_else(|| source.directory.join(LOG_FILE));
            Some(SoniaModel::load_from_files(&features, &log)?)
        }
    };

    let mut generator = Generator::new(
        &model,
        selection.as_ref().map(|s| s as &dyn SelectionModel),
        params,
        cli.seed,
    );
    if !cli.time_updates_off {
        generator = generator.with_observer(progress_observer());
    }

    let sequences = match mode {
        GenerationMode::Pre => generator.generate_sequences_pre(cli.num_seqs)?,
        GenerationMode::Post => generator.generate_sequences_post(cli.num_seqs)?,
    };
    if mode == GenerationMode::Post && generator.bound_raises() > 0 {
        info!(
            "The acceptance bound was raised {} times (final value {:.3})",
            generator.bound_raises(),
            generator.acceptance_bound()
        );
    }

    match &cli.outfile {
        Some(path) => output.write_to_file(path, &sequences)?,
        None => output.write_to_stdout(&sequences)?,
    }
    Ok(())
}
