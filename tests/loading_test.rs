mod common;

use anyhow::Result;
use std::fs;
use vdjgen::shared::model::{ModelFiles, Recombination, MARGINALS_FILE, PARAMS_FILE};
use vdjgen::{Error, GenerationParameters, Generator, Model, RecombinationType};

#[test]
fn load_vj_model_from_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    common::toy_vj_strings().write_to(dir.path());
    let model = Model::load_from_directory(dir.path(), RecombinationType::VJ)?;
    assert_eq!(model.recombination_type(), RecombinationType::VJ);
    assert_eq!(model.genomic().seg_vs.len(), 1);

    let mut gen = Generator::new(&model, None, GenerationParameters::default(), Some(0));
    let seqs = gen.generate_sequences_pre(3)?;
    assert!(seqs.iter().all(|s| s.cdr3_nt == "TGTGCCTGG"));
    Ok(())
}

#[test]
fn load_vdj_model_from_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    common::toy_vdj_strings().write_to(dir.path());
    let model = Model::load_from_files(
        &ModelFiles::in_directory(dir.path()),
        RecombinationType::VDJ,
    )?;
    assert_eq!(model.recombination_type(), RecombinationType::VDJ);
    let genomic = model.genomic();
    assert_eq!(genomic.seg_ds.len(), 2);
    assert_eq!(genomic.seg_js[1].name, "TRBJ2*01");
    Ok(())
}

#[test]
fn missing_file_is_reported_with_its_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    common::toy_vj_strings().write_to(dir.path());
    let marginals = dir.path().join(MARGINALS_FILE);
    fs::remove_file(&marginals)?;

    match Model::load_from_directory(dir.path(), RecombinationType::VJ) {
        Err(Error::ModelFile { path, .. }) => assert_eq!(path, marginals),
        other => panic!("expected a model file error, got {:?}", other),
    }

    let err = Model::load_from_directory(&dir.path().join("nowhere"), RecombinationType::VJ)
        .unwrap_err();
    assert!(err.to_string().starts_with("Model file error"));
    Ok(())
}

#[test]
fn non_contiguous_deletions() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut strings = common::toy_vj_strings();
    strings.params = strings
        .params
        .replace("v_3_del\n%0;0\n", "v_3_del\n%0;0\n%2;1\n");
    strings.write_to(dir.path());

    match Model::load_from_directory(dir.path(), RecombinationType::VJ) {
        Err(Error::ModelFile { path, reason }) => {
            assert_eq!(path, dir.path().join(PARAMS_FILE));
            assert!(reason.contains("sorted"));
        }
        other => panic!("expected a model file error, got {:?}", other),
    }
    Ok(())
}

#[test]
fn marginal_with_the_wrong_shape() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut strings = common::toy_vj_strings();
    // one V gene, two probabilities
    strings.marginals = strings
        .marginals
        .replace("@v_choice\n$Dim[1]\n#\n%1\n", "@v_choice\n$Dim[2]\n#\n%0.5,0.5\n");
    strings.write_to(dir.path());

    match Model::load_from_directory(dir.path(), RecombinationType::VJ) {
        Err(Error::ModelFile { path, .. }) => assert_eq!(path, dir.path().join(MARGINALS_FILE)),
        other => panic!("expected a model file error, got {:?}", other),
    }
    Ok(())
}

#[test]
fn missing_marginal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut strings = common::toy_vj_strings();
    let truncated = strings.marginals.split("@vj_dinucl").next().unwrap().to_string();
    strings.marginals = truncated;
    strings.write_to(dir.path());

    assert!(matches!(
        Model::load_from_directory(dir.path(), RecombinationType::VJ),
        Err(Error::ModelFile { .. })
    ));
    Ok(())
}

#[test]
fn vdj_files_need_a_d_gene() {
    // a VJ model loaded as VDJ lacks the D gene events
    let strings = common::toy_vj_strings();
    assert!(Model::load_from_str(
        &strings.params,
        &strings.marginals,
        &strings.v_anchors,
        &strings.j_anchors,
        RecombinationType::VDJ,
    )
    .is_err());
}
