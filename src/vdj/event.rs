use crate::shared::event::{Cdr3Draw, Event};
use crate::shared::sequence::Dna;
use crate::vdj::Model;
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticEvent {
    pub v_index: usize,
    pub delv: usize,
    pub j_index: usize,
    pub delj: usize,
    pub d_index: usize,
    pub deld3: usize,
    pub deld5: usize,
    pub insvd: Dna,
    pub insdj: Dna, // already reversed (5' to 3')
}

impl StaticEvent {
    /// CDR3 of the event, `None` if one of the deletions is larger than the
    /// (palindromic) segment or if it is out of frame.
    pub fn to_cdr3(&self, m: &Model) -> Option<Dna> {
        let seq_v_cdr3: &Dna = &m.genomic.seg_vs_sanitized[self.v_index];
        let seq_j_cdr3: &Dna = &m.genomic.seg_js_sanitized[self.j_index];
        let seq_d: &Dna = &m.genomic.seg_ds_sanitized[self.d_index];

        if self.delv >= seq_v_cdr3.len() {
            return None;
        }
        if seq_j_cdr3.is_empty() || self.delj > seq_j_cdr3.len() {
            return None;
        }
        if self.deld5 + self.deld3 > seq_d.len() {
            return None;
        }
        let length = seq_v_cdr3.len() - self.delv
            + self.insvd.len()
            + seq_d.len()
            - self.deld5
            - self.deld3
            + self.insdj.len()
            + seq_j_cdr3.len()
            - self.delj;
        if length % 3 != 0 {
            return None;
        }

        let mut seq: Dna = Dna::new();
        seq.extend(&seq_v_cdr3.extract_subsequence(0, seq_v_cdr3.len() - self.delv));
        seq.extend(&self.insvd);
        seq.extend(&seq_d.extract_subsequence(self.deld5, seq_d.len() - self.deld3));
        seq.extend(&self.insdj);
        seq.extend(&seq_j_cdr3.extract_subsequence(self.delj, seq_j_cdr3.len()));
        Some(seq)
    }

    pub fn to_cdr3_draw(&self, m: &Model) -> Option<Cdr3Draw> {
        self.to_cdr3(m).map(|cdr3| Cdr3Draw {
            cdr3,
            event: Event::VDJ(self.clone()),
        })
    }
}
