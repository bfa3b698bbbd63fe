//! Monte Carlo generation of CDR3 sequences from V(D)J recombination models,
//! before (`pgen`) or after (`ppost`) thymic selection.

pub mod shared;
pub mod vdj;
pub mod vj;

pub use crate::shared::{
    AminoAcid, Dna, Error, Event, Functionality, Gene, GenerationParameters, GenerationResult,
    Generator, GenomicData, Model, Recombination, RecombinationType, SelectionModel, SoniaModel,
};
