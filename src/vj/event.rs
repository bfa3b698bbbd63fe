use crate::shared::event::{Cdr3Draw, Event};
use crate::shared::sequence::Dna;
use crate::vj::Model;
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticEvent {
    pub v_index: usize,
    pub delv: usize, // nucleotides removed from the 3' end of the palindromic V
    pub j_index: usize,
    pub delj: usize, // nucleotides removed from the 5' end of the palindromic J
    pub insvj: Dna,
}

impl StaticEvent {
    /// CDR3 of the event, `None` if the deletions are larger than the
    /// CDR3 parts of the genes or if it is out of frame.
    pub fn to_cdr3(&self, m: &Model) -> Option<Dna> {
        let seq_v_cdr3: &Dna = &m.genomic.seg_vs_sanitized[self.v_index];
        let seq_j_cdr3: &Dna = &m.genomic.seg_js_sanitized[self.j_index];

        // the V side keeps at least one nucleotide (the anchor)
        if self.delv >= seq_v_cdr3.len() {
            return None;
        }
        if seq_j_cdr3.is_empty() || self.delj > seq_j_cdr3.len() {
            return None;
        }
        let length = seq_v_cdr3.len() - self.delv + self.insvj.len() + seq_j_cdr3.len() - self.delj;
        if length % 3 != 0 {
            return None;
        }

        let mut seq: Dna = Dna::new();
        seq.extend(&seq_v_cdr3.extract_subsequence(0, seq_v_cdr3.len() - self.delv));
        seq.extend(&self.insvj);
        seq.extend(&seq_j_cdr3.extract_subsequence(self.delj, seq_j_cdr3.len()));
        Some(seq)
    }

    pub fn to_cdr3_draw(&self, m: &Model) -> Option<Cdr3Draw> {
        self.to_cdr3(m).map(|cdr3| Cdr3Draw {
            cdr3,
            event: Event::VJ(self.clone()),
        })
    }
}
