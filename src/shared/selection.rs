//! Selection factors applied on top of the generation model
//!
//! A selection model maps an amino-acid CDR3 and its V/J genes to a
//! non-negative factor. Post-selection generation accepts each productive
//! sequence with a probability proportional to this factor.
use crate::shared::errors::{check_file, Error};
use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

pub const FEATURES_FILE: &str = "features.tsv";
pub const LOG_FILE: &str = "log.txt";

/// Default number of positions read from each end of the CDR3
pub const DEFAULT_MAX_DEPTH: usize = 25;

pub trait SelectionModel: Sync {
    /// Selection factor of a sequence, always `>= 0`.
    fn evaluate(&self, aa: &str, v: &str, j: &str) -> f64;

    /// A value that `evaluate` never exceeds, if the model can certify one.
    fn upper_bound(&self) -> Option<f64> {
        None
    }
}

impl<F> SelectionModel for F
where
    F: Fn(&str, &str, &str) -> f64 + Sync,
{
    fn evaluate(&self, aa: &str, v: &str, j: &str) -> f64 {
        self(aa, v, j)
    }
}

/// Left/right positional selection model.
///
/// The sequence features are its length (`l12`), the amino-acid at each of
/// the first `max_depth` positions counted from the left (`aC0`, `aA1`, ...)
/// and from the right (`aF-1`, `aG-2`, ...), and its V and J genes (`vTRBV5-1`,
/// `jTRBJ2-7`). The factor is `exp(-E) / Z` where `E` sums the energies of the
/// features present in the sequence.
#[derive(Clone, Debug)]
pub struct SoniaModel {
    energies: HashMap<String, f64>,
    // features made of several conditions, all of them must be present
    composite: Vec<(Vec<String>, f64)>,
    z: f64,
    max_depth: usize,
    keep_alleles: bool,
    min_factor: f64,
}

impl Default for SoniaModel {
    fn default() -> Self {
        SoniaModel {
            energies: HashMap::new(),
            composite: Vec::new(),
            z: 1.,
            max_depth: DEFAULT_MAX_DEPTH,
            keep_alleles: false,
            min_factor: 0.,
        }
    }
}

impl SoniaModel {
    pub fn load_from_directory(dir: &Path) -> Result<SoniaModel, Error> {
        Self::load_from_files(&dir.join(FEATURES_FILE), &dir.join(LOG_FILE))
    }

    pub fn load_from_files(path_features: &Path, path_log: &Path) -> Result<SoniaModel, Error> {
        check_file(path_features)?;
        check_file(path_log)?;
        let features = fs::read_to_string(path_features)
            .map_err(|e| Error::model_file(path_features, e.into()))?;
        let log = fs::read_to_string(path_log).map_err(|e| Error::model_file(path_log, e.into()))?;

        let mut model = SoniaModel::default();
        model
            .add_features(&features)
            .map_err(|e| Error::model_file(path_features, e))?;
        model.z = parse_normalization(&log).map_err(|e| Error::model_file(path_log, e))?;
        debug!(
            "Selection model: {} features, Z = {}",
            model.energies.len() + model.composite.len(),
            model.z
        );
        Ok(model)
    }

    pub fn load_from_str(features: &str, log: &str) -> Result<SoniaModel> {
        let mut model = SoniaModel::default();
        model.add_features(features)?;
        model.z = parse_normalization(log)?;
        Ok(model)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_keep_alleles(mut self, keep_alleles: bool) -> Self {
        self.keep_alleles = keep_alleles;
        self
    }

    pub fn with_min_factor(mut self, min_factor: f64) -> Self {
        self.min_factor = min_factor.max(0.);
        self
    }

    pub fn normalization(&self) -> f64 {
        self.z
    }

    fn add_features(&mut self, content: &str) -> Result<()> {
        for (ii, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let (Some(name), Some(value)) = (fields.next(), fields.next()) else {
                return Err(anyhow!("Line {}: expected <feature>\\t<energy>", ii + 1));
            };
            let energy = match value.trim().parse::<f64>() {
                Ok(e) => e,
                // optional header
                Err(_) if ii == 0 => continue,
                Err(_) => {
                    return Err(anyhow!("Line {}: invalid energy '{}'", ii + 1, value));
                }
            };
            if !energy.is_finite() {
                return Err(anyhow!("Line {}: non-finite energy", ii + 1));
            }
            let parts: Vec<String> = name
                .split(';')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            match parts.len() {
                0 => return Err(anyhow!("Line {}: empty feature name", ii + 1)),
                1 => *self.energies.entry(parts[0].clone()).or_insert(0.) += energy,
                _ => self.composite.push((parts, energy)),
            }
        }
        Ok(())
    }

    fn gene_name<'a>(&self, gene: &'a str) -> &'a str {
        if self.keep_alleles {
            gene
        } else {
            gene.split('*').next().unwrap_or(gene)
        }
    }

    /// Names of the features carried by a sequence
    pub fn features(&self, aa: &str, v: &str, j: &str) -> Vec<String> {
        let residues: Vec<char> = aa.chars().collect();
        let depth = self.max_depth.min(residues.len());
        let mut features = Vec::with_capacity(3 + 2 * depth);
        features.push(format!("l{}", residues.len()));
        for (ii, c) in residues.iter().take(depth).enumerate() {
            features.push(format!("a{}{}", c, ii));
        }
        for (ii, c) in residues.iter().rev().take(depth).enumerate() {
            features.push(format!("a{}{}", c, -(ii as i64) - 1));
        }
        features.push(format!("v{}", self.gene_name(v)));
        features.push(format!("j{}", self.gene_name(j)));
        features
    }

    /// Energy of a sequence, features absent from the model count for 0
    pub fn energy(&self, aa: &str, v: &str, j: &str) -> f64 {
        let features = self.features(aa, v, j);
        let mut energy: f64 = features
            .iter()
            .filter_map(|f| self.energies.get(f))
            .sum();
        if !self.composite.is_empty() {
            let present: HashSet<&str> = features.iter().map(|s| s.as_str()).collect();
            energy += self
                .composite
                .iter()
                .filter(|(parts, _)| parts.iter().all(|p| present.contains(p.as_str())))
                .map(|(_, e)| e)
                .sum::<f64>();
        }
        energy
    }
}

impl SelectionModel for SoniaModel {
    fn evaluate(&self, aa: &str, v: &str, j: &str) -> f64 {
        let q = (-self.energy(aa, v, j)).exp() / self.z;
        if q.is_finite() {
            q.max(self.min_factor)
        } else {
            self.min_factor
        }
    }
}

/// Read the normalization constant from a line `Z<sep>value`
fn parse_normalization(content: &str) -> Result<f64> {
    for line in content.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('Z') else {
            continue;
        };
        let rest = rest.trim_start_matches(|c: char| c == ':' || c == '=' || c.is_whitespace());
        if rest.len() == line.len() - 1 {
            // not a separator: another key starting with Z
            continue;
        }
        let z = rest
            .split_whitespace()
            .next()
            .unwrap_or("")
            .parse::<f64>()
            .with_context(|| format!("Invalid normalization line '{}'", line))?;
        if !(z.is_finite() && z > 0.) {
            return Err(anyhow!("The normalization Z should be positive, got {}", z));
        }
        return Ok(z);
    }
    warn!("No normalization constant found in the selection log, using Z = 1");
    Ok(1.)
}
