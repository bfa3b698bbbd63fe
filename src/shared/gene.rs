//! V/D/J gene segments and their CDR3-cut representations
use crate::shared::sequence::Dna;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Functionality status of a germline segment, as given in the anchor files
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Functionality {
    Functional,
    Orf,
    Pseudogene,
    #[default]
    Unknown,
}

impl Functionality {
    /// IMGT-like codes: "F", "(F)", "[F]" are functional, "ORF"/"(ORF)" open
    /// reading frames, "P", "(P)", "[P]" pseudogenes.
    pub fn parse(s: &str) -> Functionality {
        match s.trim().trim_matches(|c| c == '(' || c == ')' || c == '[' || c == ']') {
            "F" => Functionality::Functional,
            "ORF" => Functionality::Orf,
            "P" => Functionality::Pseudogene,
            _ => Functionality::Unknown,
        }
    }
}

impl fmt::Display for Functionality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Functionality::Functional => "F",
            Functionality::Orf => "ORF",
            Functionality::Pseudogene => "P",
            Functionality::Unknown => "?",
        };
        write!(f, "{}", s)
    }
}

/// Define some storage wrapper for the V/D/J genes
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub name: String,
    // start (for V gene) or end (for J gene) of CDR3
    // for V gene this corresponds to the position of the first nucleotide of the "C"
    // for J gene this corresponds to the position of the first nucleotide of the "F/W"
    pub cdr3_pos: Option<usize>,
    pub functional: Functionality,
    pub seq: Dna,
    pub seq_with_pal: Option<Dna>, // Dna with the palindromic insertions (model dependant)
}

impl Gene {
    pub fn new(name: &str, seq: Dna, cdr3_pos: Option<usize>, functional: &str) -> Gene {
        Gene {
            name: name.to_string(),
            cdr3_pos,
            functional: Functionality::parse(functional),
            seq,
            seq_with_pal: None,
        }
    }

    pub fn is_functional(&self) -> bool {
        self.functional == Functionality::Functional
    }

    /// Append `lenleft` (resp. `lenright`) reverse-complemented nucleotides on
    /// the 5' (resp. 3') end of the gene.
    ///```
    /// use vdjgen::{Dna, Gene};
    /// let mut g = Gene::new("V1", Dna::from_string("AACGTT").unwrap(), Some(0), "F");
    /// g.create_palindromic_ends(2, 3);
    /// assert_eq!(g.seq_with_pal.unwrap().to_string(), "TTAACGTTAAC");
    ///```
    pub fn create_palindromic_ends(&mut self, lenleft: usize, lenright: usize) {
        let lenleft = lenleft.min(self.seq.len());
        let lenright = lenright.min(self.seq.len());
        let palindromic_extension_left = self
            .seq
            .extract_subsequence(0, lenleft)
            .reverse_complement();
        let mut seqpal: Vec<u8> = palindromic_extension_left
            .seq
            .into_iter()
            .chain(self.seq.seq.iter().copied())
            .collect();
        let palindromic_extension_right = self
            .seq
            .extract_subsequence(self.seq.len() - lenright, self.seq.len())
            .reverse_complement();
        seqpal.extend(palindromic_extension_right.seq);

        self.seq_with_pal = Some(Dna { seq: seqpal });
    }
}

/// Cut the palindrome-extended V genes from their anchor to their 3' end.
/// Genes without a usable anchor give an empty sequence: they can never
/// produce a CDR3.
pub fn sanitize_v(genes: &[Gene]) -> Vec<Dna> {
    genes
        .iter()
        .map(|g| match (g.cdr3_pos, &g.seq_with_pal) {
            (Some(pos), Some(pal)) if pos < g.seq.len() => Dna {
                seq: pal.seq[pos..].to_vec(),
            },
            _ => Dna::new(),
        })
        .collect()
}

/// Cut the palindrome-extended J genes from their 5' end to the end of the
/// anchor codon (so the final F/W stays in the CDR3). J genes only carry a
/// 5' palindromic extension.
pub fn sanitize_j(genes: &[Gene]) -> Vec<Dna> {
    genes
        .iter()
        .map(|g| match (g.cdr3_pos, &g.seq_with_pal) {
            (Some(pos), Some(pal)) if pos + 3 <= g.seq.len() => Dna {
                seq: pal.seq[..pos + 3 + pal.len() - g.seq.len()].to_vec(),
            },
            _ => Dna::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn functionality_codes() {
        assert_eq!(Functionality::parse("(F)"), Functionality::Functional);
        assert_eq!(Functionality::parse("[F]"), Functionality::Functional);
        assert_eq!(Functionality::parse("ORF"), Functionality::Orf);
        assert_eq!(Functionality::parse("P"), Functionality::Pseudogene);
        assert_eq!(Functionality::parse(""), Functionality::Unknown);
    }

    #[test]
    fn cut_segments_follow_anchors() {
        let mut v = Gene::new("V1", Dna::from_string("GGGTGTGCC").unwrap(), Some(3), "F");
        let mut j = Gene::new("J1", Dna::from_string("TGGGGG").unwrap(), Some(0), "F");
        let mut missing = Gene::new("V2", Dna::from_string("GGG").unwrap(), None, "P");
        v.create_palindromic_ends(0, 2);
        j.create_palindromic_ends(1, 0);
        missing.create_palindromic_ends(0, 2);

        let vs = sanitize_v(&[v, missing]);
        assert_eq!(vs[0].to_string(), "TGTGCCGG");
        assert!(vs[1].is_empty());
        assert_eq!(sanitize_j(&[j])[0].to_string(), "ATGG");
    }
}
