//! Resolution of the user choices into a model source and a generation mode
use crate::shared::errors::{Error, Result};
use crate::shared::model::RecombinationType;
use crate::shared::sequence::AMINO_ACIDS;
use std::path::{Path, PathBuf};

/// Models shipped in the models directory
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuiltinModel {
    pub name: &'static str,
    pub folder: &'static str,
    pub recombination: RecombinationType,
}

pub static BUILTIN_MODELS: [BuiltinModel; 4] = [
    BuiltinModel {
        name: "humanTRA",
        folder: "human_T_alpha",
        recombination: RecombinationType::VJ,
    },
    BuiltinModel {
        name: "humanTRB",
        folder: "human_T_beta",
        recombination: RecombinationType::VDJ,
    },
    BuiltinModel {
        name: "mouseTRB",
        folder: "mouse_T_beta",
        recombination: RecombinationType::VDJ,
    },
    BuiltinModel {
        name: "humanIGH",
        folder: "human_B_heavy",
        recombination: RecombinationType::VDJ,
    },
];

pub const DEFAULT_MODELS_ROOT: &str = "models";

pub fn builtin_model(name: &str) -> Option<&'static BuiltinModel> {
    BUILTIN_MODELS.iter().find(|m| m.name == name)
}

/// Where the model files are and which kind of recombination they describe
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSource {
    pub name: String,
    pub directory: PathBuf,
    pub recombination: RecombinationType,
}

/// Model options as given by the user, at most one should be set
#[derive(Clone, Debug, Default)]
pub struct ModelChoice {
    pub builtin: Vec<&'static str>,
    pub custom_vj: Option<PathBuf>,
    pub custom_vdj: Option<PathBuf>,
}

impl ModelChoice {
    /// The recombination type always comes from the option used, never from
    /// the content of the model folder.
    pub fn resolve(&self, models_root: &Path) -> Result<ModelSource> {
        let mut sources: Vec<ModelSource> = Vec::new();
        for name in &self.builtin {
            let builtin = builtin_model(name)
                .ok_or_else(|| Error::Configuration(format!("Unknown model {}", name)))?;
            sources.push(ModelSource {
                name: builtin.name.to_string(),
                directory: models_root.join(builtin.folder),
                recombination: builtin.recombination,
            });
        }
        if let Some(dir) = &self.custom_vj {
            sources.push(ModelSource {
                name: format!("custom VJ model ({})", dir.display()),
                directory: dir.clone(),
                recombination: RecombinationType::VJ,
            });
        }
        if let Some(dir) = &self.custom_vdj {
            sources.push(ModelSource {
                name: format!("custom VDJ model ({})", dir.display()),
                directory: dir.clone(),
                recombination: RecombinationType::VDJ,
            });
        }

        match sources.len() {
            0 => Err(Error::Configuration(
                "Need to indicate a generative model. Use one of --humanTRA, --humanTRB, \
                 --mouseTRB, --humanIGH, --set-custom-model-vj or --set-custom-model-vdj"
                    .to_string(),
            )),
            1 => Ok(sources.remove(0)),
            _ => Err(Error::Configuration(format!(
                "Only one model can be used at a time, got: {}",
                sources
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationMode {
    /// Productive sequences from the generation model alone
    Pre,
    /// Productive sequences reweighted by a selection model
    Post,
}

impl GenerationMode {
    pub fn resolve(pre: bool, post: bool) -> Result<GenerationMode> {
        match (pre, post) {
            (true, false) => Ok(GenerationMode::Pre),
            (false, true) => Ok(GenerationMode::Post),
            (false, false) => Err(Error::Configuration(
                "Need to choose a generation mode: --pre (pgen) or --post (ppost)".to_string(),
            )),
            (true, true) => Err(Error::Configuration(
                "Only one generation mode can be chosen, not both --pre and --post".to_string(),
            )),
        }
    }
}

/// Number of sequences, also in scientific notation ("2e4")
///```
/// use vdjgen::shared::config::parse_count;
/// assert_eq!(parse_count("2e4").unwrap(), 20000);
/// assert_eq!(parse_count("15").unwrap(), 15);
/// assert!(parse_count("1.5").is_err());
/// assert!(parse_count("-3").is_err());
///```
pub fn parse_count(s: &str) -> std::result::Result<usize, String> {
    let s = s.trim();
    if let Ok(n) = s.parse::<usize>() {
        return Ok(n);
    }
    match s.parse::<f64>() {
        Ok(x) if x >= 0. && x.fract() == 0. && x <= usize::MAX as f64 => Ok(x as usize),
        _ => Err(format!("'{}' is not a valid number of sequences", s)),
    }
}

/// Validate a set of conserved J residues ("FVW")
pub fn parse_conserved_residues(s: &str) -> Result<Vec<u8>> {
    let residues: Vec<u8> = s.trim().to_ascii_uppercase().into_bytes();
    if residues.is_empty() {
        return Err(Error::Configuration(
            "The conserved J residues cannot be empty".to_string(),
        ));
    }
    if let Some(c) = residues.iter().find(|&&c| !AMINO_ACIDS.contains(&c)) {
        return Err(Error::Configuration(format!(
            "Invalid conserved J residue '{}', allowed residues are {}",
            *c as char,
            String::from_utf8_lossy(AMINO_ACIDS)
        )));
    }
    Ok(residues)
}
