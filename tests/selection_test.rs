mod common;

use anyhow::Result;
use std::fs;
use vdjgen::{
    Error, GenerationParameters, Generator, RecombinationType, SelectionModel, SoniaModel,
};

/// V1 gives CAW, V2 gives CSW, both equally likely
fn two_genes_model() -> vdjgen::Model {
    common::vj_model_strings(
        &[
            ("V1", "GGGTGTGCC", Some(3)),
            ("V2", "GGGTGTTCC", Some(3)),
        ],
        &[0.5, 0.5],
    )
    .load(RecombinationType::VJ)
}

#[test]
fn post_selection_frequencies() -> Result<()> {
    let model = two_genes_model();
    let selection = |aa: &str, _v: &str, _j: &str| if aa == "CAW" { 2. } else { 0.5 };
    let mut gen = Generator::new(
        &model,
        Some(&selection as &dyn SelectionModel),
        GenerationParameters::default(),
        Some(42),
    );
    let n = 5000;
    let seqs = gen.generate_sequences_post(n)?;
    assert_eq!(seqs.len(), n);

    // 0.5 * 2 / (0.5 * 2 + 0.5 * 0.5)
    let expected = 0.8;
    let freq = seqs.iter().filter(|s| s.v_gene == "V1").count() as f64 / n as f64;
    let sd = (expected * (1. - expected) / n as f64).sqrt();
    assert!(
        (freq - expected).abs() < 5. * sd,
        "V1 frequency {} (expected {})",
        freq,
        expected
    );
    // rejection sampling needs more draws than sequences
    assert!(gen.attempts() > n);
    assert_eq!(gen.bound_raises(), 0);
    Ok(())
}

#[test]
fn pre_selection_ignores_the_selection_model() -> Result<()> {
    let model = two_genes_model();
    let selection = |aa: &str, _v: &str, _j: &str| if aa == "CAW" { 1. } else { 0. };
    let mut gen = Generator::new(
        &model,
        Some(&selection as &dyn SelectionModel),
        GenerationParameters::default(),
        Some(1),
    );
    let seqs = gen.generate_sequences_pre(200)?;
    assert!(seqs.iter().any(|s| s.v_gene == "V2"));
    Ok(())
}

#[test]
fn acceptance_bound_is_raised() -> Result<()> {
    let model = common::toy_vj_model();
    let selection = |_aa: &str, _v: &str, _j: &str| 5.;
    let params = GenerationParameters {
        initial_acceptance_bound: 1.,
        ..Default::default()
    };
    let mut gen = Generator::new(
        &model,
        Some(&selection as &dyn SelectionModel),
        params,
        Some(0),
    );
    assert_eq!(gen.acceptance_bound(), 1.);
    let seqs = gen.generate_sequences_post(50)?;
    assert_eq!(seqs.len(), 50);
    assert_eq!(gen.bound_raises(), 1);
    assert_eq!(gen.acceptance_bound(), 5.);
    // every candidate sits on the bound
    assert_eq!(gen.attempts(), 50);
    Ok(())
}

struct Bounded;

impl SelectionModel for Bounded {
    fn evaluate(&self, _aa: &str, _v: &str, _j: &str) -> f64 {
        1.
    }

    fn upper_bound(&self) -> Option<f64> {
        Some(2.)
    }
}

#[test]
fn upper_bound_of_the_selection_model() -> Result<()> {
    let model = common::toy_vj_model();
    let mut gen = Generator::new(
        &model,
        Some(&Bounded as &dyn SelectionModel),
        GenerationParameters::default(),
        Some(0),
    );
    assert_eq!(gen.acceptance_bound(), 2.);
    gen.generate_sequences_post(100)?;
    assert_eq!(gen.bound_raises(), 0);
    assert_eq!(gen.acceptance_bound(), 2.);
    Ok(())
}

#[test]
fn post_without_selection_model() {
    let model = common::toy_vj_model();
    let mut gen = Generator::new(&model, None, GenerationParameters::default(), Some(0));
    assert!(matches!(
        gen.generate_sequences_post(10),
        Err(Error::Configuration(_))
    ));
    assert_eq!(gen.attempts(), 0);
}

#[test]
fn null_selection_gives_up() {
    let model = common::toy_vj_model();
    let selection = |_aa: &str, _v: &str, _j: &str| 0.;
    let params = GenerationParameters {
        max_attempts_per_sequence: 500,
        ..Default::default()
    };
    let mut gen = Generator::new(
        &model,
        Some(&selection as &dyn SelectionModel),
        params,
        Some(0),
    );
    match gen.generate_sequences_post(3) {
        Err(Error::Generation { attempts, accepted }) => {
            assert_eq!(attempts, 500);
            assert_eq!(accepted, 0);
        }
        other => panic!("expected a generation error, got {:?}", other),
    }
}

#[test]
fn sonia_model_from_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let features = dir.path().join("features.tsv");
    let log = dir.path().join("log.txt");
    fs::write(&features, "feature\tenergy\nvV2\t100\nl3\t0.1\n")?;
    fs::write(&log, "Epoch 10\nZ: 1.5\n")?;

    let sonia = SoniaModel::load_from_files(&features, &log)?;
    assert_eq!(sonia.normalization(), 1.5);

    let model = two_genes_model();
    let mut gen = Generator::new(
        &model,
        Some(&sonia as &dyn SelectionModel),
        GenerationParameters::default(),
        Some(9),
    );
    let seqs = gen.generate_sequences_post(200)?;
    assert!(seqs.iter().all(|s| s.v_gene == "V1" && s.cdr3_aa.as_deref() == Some("CAW")));
    Ok(())
}

#[test]
fn sonia_model_file_errors() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let features = dir.path().join("features.tsv");
    let log = dir.path().join("log.txt");
    fs::write(&log, "Z 1\n")?;

    match SoniaModel::load_from_files(&features, &log) {
        Err(Error::ModelFile { path, .. }) => assert_eq!(path, features),
        other => panic!("expected a model file error, got {:?}", other),
    }

    fs::write(&features, "l3\t0.1\nl4\tnot_a_number\n")?;
    assert!(matches!(
        SoniaModel::load_from_files(&features, &log),
        Err(Error::ModelFile { .. })
    ));
    Ok(())
}

#[test]
fn sonia_model_from_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("features.tsv"), "aW-1\t-0.5\n")?;
    fs::write(dir.path().join("log.txt"), "Z=2\n")?;
    let sonia = SoniaModel::load_from_directory(dir.path())?;
    let q = sonia.evaluate("CAW", "V1", "J1");
    assert!((q - 0.5f64.exp() / 2.).abs() < 1e-12);
    Ok(())
}
