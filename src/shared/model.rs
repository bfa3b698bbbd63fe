//! Recombination models, VJ or VDJ, selected once at load time
use crate::shared::errors::{check_file, Error};
use crate::shared::event::{Cdr3Draw, Event};
use crate::shared::genomic::GenomicData;
use crate::shared::parser::{Marginal, ParserMarginals};
use crate::{vdj, vj};
use anyhow::{anyhow, Result};
use ndarray::{Array1, Array2, ArrayD, Ix1, Ix2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const PARAMS_FILE: &str = "model_params.txt";
pub const MARGINALS_FILE: &str = "model_marginals.txt";
pub const V_ANCHORS_FILE: &str = "V_gene_CDR3_anchors.csv";
pub const J_ANCHORS_FILE: &str = "J_gene_CDR3_anchors.csv";

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecombinationType {
    #[default]
    VJ,
    VDJ,
}

impl fmt::Display for RecombinationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecombinationType::VJ => write!(f, "VJ"),
            RecombinationType::VDJ => write!(f, "VDJ"),
        }
    }
}

/// One recombination scenario drawn from the model, and its CDR3.
///
/// `draw_event` always returns a complete event, using the random draws in a
/// fixed order (genes, deletions, insertion lengths, inserted nucleotides).
/// `assemble` builds the CDR3 of the event, or `None` when the event deletes
/// more than a segment holds or is out of frame.
pub trait Recombination: Sync {
    type Event: Clone + Send;

    fn draw_event<R: Rng>(&self, rng: &mut R) -> Self::Event;

    fn assemble(&self, event: &Self::Event) -> Option<Cdr3Draw>;

    fn genomic(&self) -> &GenomicData;

    fn sample<R: Rng>(&self, rng: &mut R) -> Option<Cdr3Draw> {
        let event = self.draw_event(rng);
        self.assemble(&event)
    }
}

#[derive(Clone, Debug)]
pub enum Model {
    VJ(vj::Model),
    VDJ(vdj::Model),
}

/// Paths of the four files describing a recombination model
#[derive(Clone, Debug)]
pub struct ModelFiles {
    pub params: PathBuf,
    pub marginals: PathBuf,
    pub v_anchors: PathBuf,
    pub j_anchors: PathBuf,
}

impl ModelFiles {
    pub fn in_directory(dir: &Path) -> ModelFiles {
        ModelFiles {
            params: dir.join(PARAMS_FILE),
            marginals: dir.join(MARGINALS_FILE),
            v_anchors: dir.join(V_ANCHORS_FILE),
            j_anchors: dir.join(J_ANCHORS_FILE),
        }
    }
}

impl Model {
    pub fn load_from_directory(
        dir: &Path,
        recombination: RecombinationType,
    ) -> Result<Model, Error> {
        Self::load_from_files(&ModelFiles::in_directory(dir), recombination)
    }

    pub fn load_from_files(
        files: &ModelFiles,
        recombination: RecombinationType,
    ) -> Result<Model, Error> {
        check_file(&files.marginals)?;
        let (genomic, _) = GenomicData::load_from_files(
            &files.params,
            &files.v_anchors,
            &files.j_anchors,
            recombination,
        )?;
        let pm = ParserMarginals::load(&files.marginals)
            .map_err(|e| Error::model_file(&files.marginals, e))?;
        let model = match recombination {
            RecombinationType::VJ => vj::Model::load_model(genomic, &pm).map(Model::VJ),
            RecombinationType::VDJ => vdj::Model::load_model(genomic, &pm).map(Model::VDJ),
        }
        .map_err(|e| Error::model_file(&files.marginals, e))?;
        log::info!(
            "Loaded {} model ({} V, {} J genes)",
            recombination,
            model.genomic().seg_vs.len(),
            model.genomic().seg_js.len()
        );
        Ok(model)
    }

    pub fn load_from_str(
        params: &str,
        marginals: &str,
        anchor_vgene: &str,
        anchor_jgene: &str,
        recombination: RecombinationType,
    ) -> Result<Model> {
        Ok(match recombination {
            RecombinationType::VJ => Model::VJ(vj::Model::load_from_str(
                params,
                marginals,
                anchor_vgene,
                anchor_jgene,
            )?),
            RecombinationType::VDJ => Model::VDJ(vdj::Model::load_from_str(
                params,
                marginals,
                anchor_vgene,
                anchor_jgene,
            )?),
        })
    }

    pub fn recombination_type(&self) -> RecombinationType {
        match self {
            Model::VJ(_) => RecombinationType::VJ,
            Model::VDJ(_) => RecombinationType::VDJ,
        }
    }
}

impl Recombination for Model {
    type Event = Event;

    fn draw_event<R: Rng>(&self, rng: &mut R) -> Event {
        match self {
            Model::VJ(m) => Event::VJ(m.draw_event(rng)),
            Model::VDJ(m) => Event::VDJ(m.draw_event(rng)),
        }
    }

    fn assemble(&self, event: &Event) -> Option<Cdr3Draw> {
        match (self, event) {
            (Model::VJ(m), Event::VJ(e)) => m.assemble(e),
            (Model::VDJ(m), Event::VDJ(e)) => m.assemble(e),
            _ => None,
        }
    }

    fn genomic(&self) -> &GenomicData {
        match self {
            Model::VJ(m) => &m.genomic,
            Model::VDJ(m) => &m.genomic,
        }
    }
}

// Helpers shared by the VJ and VDJ loaders

fn shape_error(key: &str, marginal: &Marginal) -> anyhow::Error {
    anyhow!(
        "Wrong dimensions {:?} for {} (depends on {:?})",
        marginal.probabilities.shape(),
        key,
        marginal.dependences
    )
}

/// One-dimensional marginal `key`, with `expected` values
pub(crate) fn marginal_1d(pm: &ParserMarginals, key: &str, expected: usize) -> Result<Array1<f64>> {
    let marginal = pm.get(key)?;
    let arr = marginal
        .probabilities
        .clone()
        .into_dimensionality::<Ix1>()
        .map_err(|_| shape_error(key, marginal))?;
    if arr.len() != expected {
        return Err(shape_error(key, marginal));
    }
    Ok(arr)
}

/// Marginal `key` conditioned on a gene with `n_genes` values, shape
/// (`n_genes`, `n_values`). A marginal without dependence is repeated for
/// every gene.
pub(crate) fn marginal_given_gene(
    pm: &ParserMarginals,
    key: &str,
    n_genes: usize,
    n_values: usize,
) -> Result<Array2<f64>> {
    let marginal = pm.get(key)?;
    let probs: &ArrayD<f64> = &marginal.probabilities;
    let arr = match probs.ndim() {
        1 => probs
            .broadcast(ndarray::IxDyn(&[n_genes, probs.len()]))
            .ok_or_else(|| shape_error(key, marginal))?
            .to_owned()
            .into_dimensionality::<Ix2>()?,
        2 => probs.clone().into_dimensionality::<Ix2>()?,
        _ => return Err(shape_error(key, marginal)),
    };
    if arr.dim() != (n_genes, n_values) {
        return Err(shape_error(key, marginal));
    }
    Ok(arr)
}

/// Dinucleotide Markov table, reshaped 4x4 (row = previous nucleotide)
pub(crate) fn dinucleotide_matrix(pm: &ParserMarginals, key: &str) -> Result<Array2<f64>> {
    let marginal = pm.get(key)?;
    if marginal.probabilities.len() != 16 {
        return Err(shape_error(key, marginal));
    }
    Array2::from_shape_vec((4, 4), marginal.probabilities.iter().copied().collect())
        .map_err(|_| shape_error(key, marginal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_files_layout() {
        let files = ModelFiles::in_directory(Path::new("models/human_T_beta"));
        assert_eq!(
            files.params,
            Path::new("models/human_T_beta/model_params.txt")
        );
        assert_eq!(
            files.j_anchors,
            Path::new("models/human_T_beta/J_gene_CDR3_anchors.csv")
        );
    }

    #[test]
    fn unconditioned_marginal_is_broadcast() {
        let pm = ParserMarginals::parse(
            crate::shared::parser::parse_str("@v_3_del\n$Dim[3]\n#\n%0.2,0.3,0.5\n").unwrap(),
        )
        .unwrap();
        let arr = marginal_given_gene(&pm, "v_3_del", 2, 3).unwrap();
        assert_eq!(arr.dim(), (2, 3));
        assert!((arr[[1, 2]] - 0.5).abs() < 1e-12);
        assert!(marginal_given_gene(&pm, "v_3_del", 2, 4).is_err());
    }
}
