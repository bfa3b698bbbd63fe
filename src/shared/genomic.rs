//! Germline segment catalog of a recombination model
use crate::shared::errors::{check_file, Error};
use crate::shared::gene::{sanitize_j, sanitize_v, Gene};
use crate::shared::model::RecombinationType;
use crate::shared::parser::{parse_file, parse_str, ParserParams};
use crate::shared::sequence::Dna;
use crate::shared::utils::{
    palindrome_length, range_of, sorted_and_complete, sorted_and_complete_0start,
    CONTIGUITY_ERROR,
};
use anyhow::{anyhow, Result};
use log::{debug, warn};
use std::fs::File;
use std::path::Path;

/// V, J (and D) segments with their anchors, and the CDR3-cut versions of
/// these segments extended with the maximal number of palindromic
/// nucleotides allowed by the deletion ranges.
#[derive(Default, Clone, Debug)]
pub struct GenomicData {
    pub recombination: RecombinationType,
    pub seg_vs: Vec<Gene>,
    pub seg_js: Vec<Gene>,
    pub seg_ds: Vec<Gene>,

    // match genomic_data.cutV_genomic_CDR3_seqs
    pub seg_vs_sanitized: Vec<Dna>,
    pub seg_js_sanitized: Vec<Dna>,
    pub seg_ds_sanitized: Vec<Dna>,

    pub range_del_v: (i64, i64),
    pub range_del_j: (i64, i64),
    pub range_del_d5: (i64, i64),
    pub range_del_d3: (i64, i64),
}

impl GenomicData {
    pub fn load_from_files(
        path_params: &Path,
        path_anchor_vgene: &Path,
        path_anchor_jgene: &Path,
        recombination: RecombinationType,
    ) -> Result<(GenomicData, ParserParams), Error> {
        for path in [path_params, path_anchor_vgene, path_anchor_jgene] {
            check_file(path)?;
        }
        let mut pp = parse_file(path_params)
            .and_then(ParserParams::parse)
            .map_err(|e| Error::model_file(path_params, e))?;

        let rdr_v = File::open(path_anchor_vgene).map_err(|e| Error::model_file(path_anchor_vgene, e.into()))?;
        pp.add_anchors_gene(rdr_v, "v_choice")
            .map_err(|e| Error::model_file(path_anchor_vgene, e))?;
        let rdr_j = File::open(path_anchor_jgene).map_err(|e| Error::model_file(path_anchor_jgene, e.into()))?;
        pp.add_anchors_gene(rdr_j, "j_choice")
            .map_err(|e| Error::model_file(path_anchor_jgene, e))?;

        let genomic =
            Self::from_params(&pp, recombination).map_err(|e| Error::model_file(path_params, e))?;
        Ok((genomic, pp))
    }

    pub fn load_from_str(
        params: &str,
        anchor_vgene: &str,
        anchor_jgene: &str,
        recombination: RecombinationType,
    ) -> Result<(GenomicData, ParserParams)> {
        let mut pp = ParserParams::parse(parse_str(params)?)?;
        pp.add_anchors_gene(anchor_vgene.as_bytes(), "v_choice")?;
        pp.add_anchors_gene(anchor_jgene.as_bytes(), "j_choice")?;
        let genomic = Self::from_params(&pp, recombination)?;
        Ok((genomic, pp))
    }

    pub fn from_params(pp: &ParserParams, recombination: RecombinationType) -> Result<GenomicData> {
        let arrdelv = pp.numbers("v_3_del")?;
        let arrdelj = pp.numbers("j_5_del")?;
        let mut contiguous = sorted_and_complete(&arrdelv) & sorted_and_complete(&arrdelj);

        let mut genomic = GenomicData {
            recombination,
            seg_vs: pp.genes("v_choice")?,
            seg_js: pp.genes("j_choice")?,
            range_del_v: range_of("v_3_del", &arrdelv)?,
            range_del_j: range_of("j_5_del", &arrdelj)?,
            ..Default::default()
        };

        match recombination {
            RecombinationType::VJ => {
                contiguous &= sorted_and_complete_0start(&pp.numbers("vj_ins")?);
            }
            RecombinationType::VDJ => {
                let arrdeld5 = pp.numbers("d_5_del")?;
                let arrdeld3 = pp.numbers("d_3_del")?;
                contiguous &= sorted_and_complete(&arrdeld5)
                    & sorted_and_complete(&arrdeld3)
                    & sorted_and_complete_0start(&pp.numbers("vd_ins")?)
                    & sorted_and_complete_0start(&pp.numbers("dj_ins")?);
                genomic.seg_ds = pp.genes("d_gene")?;
                genomic.range_del_d5 = range_of("d_5_del", &arrdeld5)?;
                genomic.range_del_d3 = range_of("d_3_del", &arrdeld3)?;
            }
        }
        if !contiguous {
            return Err(anyhow!(CONTIGUITY_ERROR));
        }
        if genomic.seg_vs.is_empty() || genomic.seg_js.is_empty() {
            return Err(anyhow!("The model needs at least one V and one J gene"));
        }
        if recombination == RecombinationType::VDJ && genomic.seg_ds.is_empty() {
            return Err(anyhow!("A VDJ model needs at least one D gene"));
        }

        genomic.sanitize_genes();
        Ok(genomic)
    }

    /// Add the palindromic insertions and cut the V/J at the CDR3 region
    pub fn sanitize_genes(&mut self) {
        let pal_v = palindrome_length(self.range_del_v);
        let pal_j = palindrome_length(self.range_del_j);
        let pal_d5 = palindrome_length(self.range_del_d5);
        let pal_d3 = palindrome_length(self.range_del_d3);

        for g in self.seg_vs.iter_mut() {
            g.create_palindromic_ends(0, pal_v);
        }
        for g in self.seg_js.iter_mut() {
            g.create_palindromic_ends(pal_j, 0);
        }
        for g in self.seg_ds.iter_mut() {
            g.create_palindromic_ends(pal_d5, pal_d3);
        }

        self.seg_vs_sanitized = sanitize_v(&self.seg_vs);
        self.seg_js_sanitized = sanitize_j(&self.seg_js);
        self.seg_ds_sanitized = self
            .seg_ds
            .iter()
            .map(|g| g.seq_with_pal.clone().unwrap_or_default())
            .collect();

        let unusable = self
            .seg_vs_sanitized
            .iter()
            .chain(self.seg_js_sanitized.iter())
            .filter(|s| s.is_empty())
            .count();
        if unusable > 0 {
            warn!("{} V/J genes have no usable CDR3 anchor", unusable);
        }
        debug!(
            "Genomic data: {} V, {} D, {} J genes",
            self.seg_vs.len(),
            self.seg_ds.len(),
            self.seg_js.len()
        );
    }

    /// Full V(D)J sequence around a CDR3: germline V up to its anchor, the
    /// CDR3, then germline J after the anchor codon.
    /// Return full_seq and the start of the CDR3 in it.
    pub fn recreate_full_sequence(&self, cdr3: &Dna, v_index: usize, j_index: usize) -> (Dna, usize) {
        let mut seq: Dna = Dna::new();
        let vgene = &self.seg_vs[v_index];
        let jgene = &self.seg_js[j_index];
        let v_end = vgene.cdr3_pos.unwrap_or(0).min(vgene.seq.len());
        let j_start = jgene
            .cdr3_pos
            .map_or(jgene.seq.len(), |p| p + 3)
            .min(jgene.seq.len());
        seq.extend(&vgene.seq.extract_subsequence(0, v_end));
        seq.extend(cdr3);
        seq.extend(&jgene.seq.extract_subsequence(j_start, jgene.seq.len()));
        (seq, v_end)
    }
}
