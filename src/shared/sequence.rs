/// Contains the basic structs and functions for nucleotide and amino-acid sequences
use anyhow::{anyhow, Result};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;

static DNA_TO_AMINO: phf::Map<&'static str, u8> = phf_map! {
    "TTT" => b'F', "TTC" => b'F', "TTA" => b'L', "TTG" => b'L', "TCT" => b'S', "TCC" => b'S',
    "TCA" => b'S', "TCG" => b'S', "TAT" => b'Y', "TAC" => b'Y', "TAA" => b'*', "TAG" => b'*',
    "TGT" => b'C', "TGC" => b'C', "TGA" => b'*', "TGG" => b'W', "CTT" => b'L', "CTC" => b'L',
    "CTA" => b'L', "CTG" => b'L', "CCT" => b'P', "CCC" => b'P', "CCA" => b'P', "CCG" => b'P',
    "CAT" => b'H', "CAC" => b'H', "CAA" => b'Q', "CAG" => b'Q', "CGT" => b'R', "CGC" => b'R',
    "CGA" => b'R', "CGG" => b'R', "ATT" => b'I', "ATC" => b'I', "ATA" => b'I', "ATG" => b'M',
    "ACT" => b'T', "ACC" => b'T', "ACA" => b'T', "ACG" => b'T', "AAT" => b'N', "AAC" => b'N',
    "AAA" => b'K', "AAG" => b'K', "AGT" => b'S', "AGC" => b'S', "AGA" => b'R', "AGG" => b'R',
    "GTT" => b'V', "GTC" => b'V', "GTA" => b'V', "GTG" => b'V', "GCT" => b'A', "GCC" => b'A',
    "GCA" => b'A', "GCG" => b'A', "GAT" => b'D', "GAC" => b'D', "GAA" => b'E', "GAG" => b'E',
    "GGT" => b'G', "GGC" => b'G', "GGA" => b'G', "GGG" => b'G'
};

// The standard ACGT nucleotides, in the order used by the dinucleotide tables
pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];

static COMPLEMENT: phf::Map<u8, u8> = phf_map! {
    b'A' => b'T', b'T' => b'A', b'G' => b'C', b'C' => b'G', b'N' => b'N',
};

/// One-letter codes accepted in amino-acid sequences (including the stop codon)
pub const AMINO_ACIDS: &[u8] = b"ACDEFGHIKLMNPQRSTVWY*";

/// Index of a nucleotide in `NUCLEOTIDES` (ambiguous nucleotides map to 0)
pub fn nucleotides_inv(n: u8) -> usize {
    static LOOKUP_TABLE: [usize; 256] = {
        let mut table = [0; 256];
        table[b'A' as usize] = 0;
        table[b'C' as usize] = 1;
        table[b'G' as usize] = 2;
        table[b'T' as usize] = 3;
        table
    };

    LOOKUP_TABLE[n as usize]
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dna {
    pub seq: Vec<u8>,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AminoAcid {
    pub seq: Vec<u8>,
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.seq))
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.seq))
    }
}

impl Dna {
    pub fn new() -> Dna {
        Dna { seq: Vec::new() }
    }

    /// Parse a nucleotide string (case-insensitive, ACGT and N only)
    pub fn from_string(s: &str) -> Result<Dna> {
        let seq = s.trim().to_ascii_uppercase().into_bytes();
        if let Some(&byte) = seq.iter().find(|b| !COMPLEMENT.contains_key(*b)) {
            return Err(anyhow!("Invalid nucleotide '{}' in {}", byte as char, s));
        }
        Ok(Dna { seq })
    }

    pub fn get_string(&self) -> String {
        self.to_string()
    }

    /// Translate the sequence in frame 0. Fails if the length is not a multiple of 3.
    ///```
    /// use vdjgen::Dna;
    /// let a = Dna::from_string("TGTGCCTGG").unwrap();
    /// assert_eq!(a.translate().unwrap().to_string(), "CAW");
    /// assert!(Dna::from_string("TGTG").unwrap().translate().is_err());
    ///```
    pub fn translate(&self) -> Result<AminoAcid> {
        if self.seq.len() % 3 != 0 {
            return Err(anyhow!("Translation not possible, invalid length."));
        }

        let amino_sequence: Vec<u8> = self
            .seq
            .chunks(3)
            .map(|codon| {
                std::str::from_utf8(codon)
                    .ok()
                    .and_then(|c| DNA_TO_AMINO.get(c).copied())
                    .unwrap_or(b'X') // codons with an N
            })
            .collect();
        Ok(AminoAcid {
            seq: amino_sequence,
        })
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn extend(&mut self, dna: &Dna) {
        self.seq.extend(dna.seq.iter());
    }

    pub fn reverse(&mut self) {
        self.seq.reverse();
    }

    pub fn reverse_complement(&self) -> Dna {
        Dna {
            seq: self
                .seq
                .iter()
                .filter_map(|x| COMPLEMENT.get(x).copied())
                .rev()
                .collect(),
        }
    }

    /// Return dna[start:end]
    pub fn extract_subsequence(&self, start: usize, end: usize) -> Dna {
        Dna {
            seq: self.seq[start..end].to_vec(),
        }
    }
}

impl AminoAcid {
    pub fn from_string(s: &str) -> Result<AminoAcid> {
        let seq = s.trim().to_ascii_uppercase().into_bytes();
        if let Some(&byte) = seq.iter().find(|b| !AMINO_ACIDS.contains(b)) {
            return Err(anyhow!("Invalid amino-acid '{}' in {}", byte as char, s));
        }
        Ok(AminoAcid { seq })
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn contains_stop(&self) -> bool {
        self.seq.contains(&b'*')
    }

    pub fn last(&self) -> Option<u8> {
        self.seq.last().copied()
    }
}
