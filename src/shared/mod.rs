//! Shared functionalities between VDJ and VJ
pub mod config;
pub mod distributions;
pub mod errors;
pub mod event;
pub mod gene;
pub mod generator;
pub mod genomic;
pub mod model;
pub mod output;
pub mod parser;
pub mod selection;
pub mod sequence;
pub mod utils;

pub use errors::Error;
pub use event::{Cdr3Draw, Event};
pub use gene::{Functionality, Gene};
pub use generator::{
    GenerationParameters, GenerationResult, Generator, LogProgress, ProgressObserver,
};
pub use genomic::GenomicData;
pub use model::{Model, ModelFiles, Recombination, RecombinationType};
pub use selection::{SelectionModel, SoniaModel};
pub use sequence::{AminoAcid, Dna};

#[cfg(feature = "kdam")]
pub use generator::BarProgress;
