//! Generation of productive sequences, before or after selection
use crate::shared::errors::{Error, Result};
use crate::shared::event::{Cdr3Draw, Event};
use crate::shared::model::{Model, Recombination};
use crate::shared::selection::SelectionModel;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const DEFAULT_CONSERVED_J_RESIDUES: &str = "FVW";

#[derive(Clone, Debug)]
pub struct GenerationParameters {
    /// Accepted last residues of a productive CDR3
    pub conserved_j_residues: Vec<u8>,
    /// Number of consecutive draws without a new accepted sequence before
    /// giving up
    pub max_attempts_per_sequence: usize,
    /// Starting value of the rejection bound when the selection model cannot
    /// provide one
    pub initial_acceptance_bound: f64,
    /// The progress observer is called every `progress_every` draws
    pub progress_every: usize,
    pub parallel: bool,
    /// Number of draws sent to the workers at once (parallel mode)
    pub batch_size: usize,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        GenerationParameters {
            conserved_j_residues: DEFAULT_CONSERVED_J_RESIDUES.as_bytes().to_vec(),
            max_attempts_per_sequence: 1_000_000,
            initial_acceptance_bound: 10.,
            progress_every: 100_000,
            parallel: false,
            batch_size: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub cdr3_nt: String,
    pub cdr3_aa: Option<String>,
    pub full_seq: String,
    pub v_gene: String,
    pub j_gene: String,
    pub d_gene: Option<String>,
    pub productive: bool,
    pub recombination_event: Event,
}

/// Receives the state of the generation at regular intervals
pub trait ProgressObserver {
    fn update(&mut self, attempts: usize, accepted: usize, target: usize);

    fn finish(&mut self, _attempts: usize, _accepted: usize) {}
}

/// Time updates through the `log` crate
pub struct LogProgress {
    start: Instant,
}

impl LogProgress {
    pub fn new() -> LogProgress {
        LogProgress {
            start: Instant::now(),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for LogProgress {
    fn update(&mut self, attempts: usize, accepted: usize, target: usize) {
        let elapsed = self.start.elapsed().as_secs_f64();
        if accepted == 0 {
            info!(
                "0 sequences accepted after {} attempts ({:.2} seconds)",
                attempts, elapsed
            );
            return;
        }
        let remaining = elapsed * (target.saturating_sub(accepted)) as f64 / accepted as f64;
        info!(
            "{} sequences generated in {:.2} seconds. Estimated time remaining: {:.2} seconds",
            accepted, elapsed, remaining
        );
    }

    fn finish(&mut self, attempts: usize, accepted: usize) {
        info!(
            "Completed generating all {} sequences in {:.2} seconds ({} draws)",
            accepted,
            self.start.elapsed().as_secs_f64(),
            attempts
        );
    }
}

/// Terminal progress bar on the number of accepted sequences
#[cfg(feature = "kdam")]
pub struct BarProgress {
    bar: Option<kdam::Bar>,
}

#[cfg(feature = "kdam")]
impl BarProgress {
    pub fn new() -> BarProgress {
        BarProgress { bar: None }
    }
}

#[cfg(feature = "kdam")]
impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "kdam")]
impl ProgressObserver for BarProgress {
    fn update(&mut self, _attempts: usize, accepted: usize, target: usize) {
        use kdam::BarExt;
        let bar = self
            .bar
            .get_or_insert_with(|| kdam::tqdm!(total = target, desc = "Generating"));
        // a broken terminal should not stop the generation
        let _ = bar.update_to(accepted);
    }

    fn finish(&mut self, _attempts: usize, accepted: usize) {
        use kdam::BarExt;
        if let Some(bar) = self.bar.as_mut() {
            let _ = bar.update_to(accepted);
            eprintln!();
        }
    }
}

/// Sequence generation engine.
///
/// The model and the selection model are borrowed for the lifetime of the
/// generator and never modified. The rejection bound is owned by the
/// generator: it only grows, when a selection factor larger than the current
/// bound is met.
pub struct Generator<'a> {
    model: &'a Model,
    selection: Option<&'a dyn SelectionModel>,
    params: GenerationParameters,
    rng: SmallRng,
    observer: Option<Box<dyn ProgressObserver + 'a>>,
    attempts: usize,
    accepted: usize,
    acceptance_bound: f64,
    bound_raises: usize,
}

impl<'a> Generator<'a> {
    pub fn new(
        model: &'a Model,
        selection: Option<&'a dyn SelectionModel>,
        params: GenerationParameters,
        seed: Option<u64>,
    ) -> Generator<'a> {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_entropy(),
        };
        let acceptance_bound = selection
            .and_then(|s| s.upper_bound())
            .filter(|b| b.is_finite() && *b > 0.)
            .unwrap_or(params.initial_acceptance_bound);
        Generator {
            model,
            selection,
            params,
            rng,
            observer: None,
            attempts: 0,
            accepted: 0,
            acceptance_bound,
            bound_raises: 0,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ProgressObserver + 'a>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Total number of recombination events drawn
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Total number of sequences returned
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn acceptance_bound(&self) -> f64 {
        self.acceptance_bound
    }

    /// Number of times the acceptance bound had to be raised
    pub fn bound_raises(&self) -> usize {
        self.bound_raises
    }

    /// Productive sequences distributed as the generation model
    pub fn generate_sequences_pre(&mut self, count: usize) -> Result<Vec<GenerationResult>> {
        self.generate(count, false)
    }

    /// Productive sequences reweighted by the selection model, by rejection
    /// sampling
    pub fn generate_sequences_post(&mut self, count: usize) -> Result<Vec<GenerationResult>> {
        if self.selection.is_none() {
            return Err(Error::Configuration(
                "Post-selection generation needs a selection model".to_string(),
            ));
        }
        self.generate(count, true)
    }

    fn generate(&mut self, count: usize, post: bool) -> Result<Vec<GenerationResult>> {
        let mut sequences = Vec::with_capacity(count);
        if count == 0 {
            return Ok(sequences);
        }
        let progress_every = self.params.progress_every.max(1);
        let mut since_accepted = 0;

        while sequences.len() < count {
            let batch = self.draw_batch();
            for candidate in batch {
                self.attempts += 1;
                since_accepted += 1;

                if let Some(result) = candidate {
                    if !post || self.accept(&result) {
                        sequences.push(result);
                        self.accepted += 1;
                        since_accepted = 0;
                    }
                }

                if self.attempts % progress_every == 0 {
                    if let Some(obs) = self.observer.as_mut() {
                        obs.update(self.attempts, sequences.len(), count);
                    }
                }
                if sequences.len() == count {
                    break;
                }
                if since_accepted >= self.params.max_attempts_per_sequence {
                    return Err(Error::Generation {
                        attempts: since_accepted,
                        accepted: sequences.len(),
                    });
                }
            }
        }

        if let Some(obs) = self.observer.as_mut() {
            obs.finish(self.attempts, sequences.len());
        }
        if self.bound_raises > 0 {
            debug!(
                "Acceptance bound raised {} times, final value {}",
                self.bound_raises, self.acceptance_bound
            );
        }
        Ok(sequences)
    }

    /// Draw the next candidates, in draw order. `None` marks a draw that
    /// gave no productive sequence.
    fn draw_batch(&mut self) -> Vec<Option<GenerationResult>> {
        let model = self.model;
        let conserved = &self.params.conserved_j_residues;
        if !self.params.parallel {
            return vec![to_candidate(model, conserved, model.sample(&mut self.rng))];
        }
        // one seed per draw, so the stream only depends on the seed and the
        // batch size, not on the scheduling of the workers
        let seeds: Vec<u64> = (0..self.params.batch_size.max(1))
            .map(|_| self.rng.gen())
            .collect();
        seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = SmallRng::seed_from_u64(seed);
                to_candidate(model, conserved, model.sample(&mut rng))
            })
            .collect()
    }

    /// Rejection step: accept with probability factor / bound, raising the
    /// bound first if the factor exceeds it.
    fn accept(&mut self, result: &GenerationResult) -> bool {
        let Some(selection) = self.selection else {
            return true;
        };
        let aa = result.cdr3_aa.as_deref().unwrap_or("");
        let factor = selection.evaluate(aa, &result.v_gene, &result.j_gene);
        if factor > self.acceptance_bound {
            debug!(
                "Selection factor {} above the acceptance bound {}, raising the bound",
                factor, self.acceptance_bound
            );
            self.acceptance_bound = factor;
            self.bound_raises += 1;
        }
        let u: f64 = self.rng.gen();
        u * self.acceptance_bound < factor
    }
}

fn to_candidate(
    model: &Model,
    conserved_j_residues: &[u8],
    draw: Option<Cdr3Draw>,
) -> Option<GenerationResult> {
    let result = to_result(model, conserved_j_residues, draw?);
    result.productive.then_some(result)
}

/// Translate a CDR3 draw and attach its gene names and full sequence
pub fn to_result(model: &Model, conserved_j_residues: &[u8], draw: Cdr3Draw) -> GenerationResult {
    let genomic = model.genomic();
    let aa = draw.cdr3.translate().ok();
    let productive = aa.as_ref().is_some_and(|aa| {
        !aa.contains_stop()
            && aa
                .last()
                .is_some_and(|c| conserved_j_residues.contains(&c))
    });
    let (v_index, j_index) = (draw.event.v_index(), draw.event.j_index());
    let (full_seq, _) = genomic.recreate_full_sequence(&draw.cdr3, v_index, j_index);
    GenerationResult {
        cdr3_nt: draw.cdr3.get_string(),
        cdr3_aa: aa.map(|x| x.to_string()),
        full_seq: full_seq.get_string(),
        v_gene: genomic.seg_vs[v_index].name.clone(),
        j_gene: genomic.seg_js[j_index].name.clone(),
        d_gene: draw
            .event
            .d_index()
            .map(|d| genomic.seg_ds[d].name.clone()),
        productive,
        recombination_event: draw.event,
    }
}
