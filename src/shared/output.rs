//! Layout and writing of the generated sequences
use crate::shared::errors::{Error, Result};
use crate::shared::generator::GenerationResult;
use csv::WriterBuilder;
use log::info;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which sequences appear in a record
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeqType {
    #[default]
    All,
    Nucleotide,
    AminoAcid,
}

impl FromStr for SeqType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<SeqType, String> {
        match s {
            "all" => Ok(SeqType::All),
            "ntseq" | "nucleotide" => Ok(SeqType::Nucleotide),
            "aaseq" | "amino_acid" => Ok(SeqType::AminoAcid),
            _ => Err(format!(
                "'{}' is not a sequence type, use all, ntseq, nucleotide, aaseq or amino_acid",
                s
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct OutputSettings {
    pub seq_type: SeqType,
    pub record_genes: bool,
    pub delimiter: u8,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            seq_type: SeqType::All,
            record_genes: true,
            delimiter: b'\t',
        }
    }
}

/// Named delimiters, or any single character with `raw`
///```
/// use vdjgen::shared::output::parse_delimiter;
/// assert_eq!(parse_delimiter("tab", false).unwrap(), b'\t');
/// assert_eq!(parse_delimiter(";", false).unwrap(), b';');
/// assert_eq!(parse_delimiter("|", true).unwrap(), b'|');
/// assert!(parse_delimiter("|", false).is_err());
///```
pub fn parse_delimiter(s: &str, raw: bool) -> Result<u8> {
    if raw {
        return match s.as_bytes() {
            [c] => Ok(*c),
            _ => Err(Error::Configuration(format!(
                "A raw delimiter should be a single character, got '{}'",
                s
            ))),
        };
    }
    match s {
        "tab" | "\t" => Ok(b'\t'),
        "space" | " " => Ok(b' '),
        "," | "comma" => Ok(b','),
        ";" | "semicolon" => Ok(b';'),
        ":" | "colon" => Ok(b':'),
        _ => Err(Error::Configuration(format!(
            "Invalid delimiter '{}', use tab, space, ',', ';' or ':' (or --raw-delimiter)",
            s
        ))),
    }
}

/// Default delimiter for an output path: commas for `.csv`, tabs otherwise
pub fn default_delimiter(outfile: Option<&Path>) -> u8 {
    match outfile.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

impl OutputSettings {
    /// Fields of one output line
    pub fn record<'a>(&self, seq: &'a GenerationResult) -> Vec<&'a str> {
        let mut fields = Vec::with_capacity(4);
        if matches!(self.seq_type, SeqType::All | SeqType::Nucleotide) {
            fields.push(seq.cdr3_nt.as_str());
        }
        if matches!(self.seq_type, SeqType::All | SeqType::AminoAcid) {
            fields.push(seq.cdr3_aa.as_deref().unwrap_or(""));
        }
        if self.record_genes {
            fields.push(seq.v_gene.as_str());
            fields.push(seq.j_gene.as_str());
        }
        fields
    }

    pub fn write_sequences<W: Write>(&self, writer: W, seqs: &[GenerationResult]) -> Result<()> {
        let mut wtr = WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(writer);
        for seq in seqs {
            wtr.write_record(self.record(seq))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write all the sequences to `path`. The records go to a temporary file
    /// next to the destination, renamed once complete.
    pub fn write_to_file(&self, path: &Path, seqs: &[GenerationResult]) -> Result<()> {
        let tmp = temporary_path(path);
        let written = File::create(&tmp)
            .map_err(Error::from)
            .and_then(|file| {
                let mut buffer = BufWriter::new(file);
                self.write_sequences(&mut buffer, seqs)?;
                let file = buffer.into_inner().map_err(|e| e.into_error())?;
                file.sync_all()?;
                Ok(())
            })
            .and_then(|()| fs::rename(&tmp, path).map_err(Error::from));
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written?;
        info!("{} sequences written to {}", seqs.len(), path.display());
        Ok(())
    }

    pub fn write_to_stdout(&self, seqs: &[GenerationResult]) -> Result<()> {
        let stdout = io::stdout();
        self.write_sequences(stdout.lock(), seqs)
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sequences".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::event::Event;
    use crate::vj::StaticEvent;

    fn result() -> GenerationResult {
        GenerationResult {
            cdr3_nt: "TGTGCCTGG".to_string(),
            cdr3_aa: Some("CAW".to_string()),
            full_seq: "GGGTGTGCCTGGGGG".to_string(),
            v_gene: "V1".to_string(),
            j_gene: "J1".to_string(),
            d_gene: None,
            productive: true,
            recombination_event: Event::VJ(StaticEvent::default()),
        }
    }

    fn written(settings: &OutputSettings) -> String {
        let mut out = Vec::new();
        settings.write_sequences(&mut out, &[result()]).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn record_layouts() {
        let mut settings = OutputSettings::default();
        assert_eq!(written(&settings), "TGTGCCTGG\tCAW\tV1\tJ1\n");
        settings.seq_type = SeqType::AminoAcid;
        settings.record_genes = false;
        assert_eq!(written(&settings), "CAW\n");
        settings.seq_type = SeqType::Nucleotide;
        settings.delimiter = b',';
        settings.record_genes = true;
        assert_eq!(written(&settings), "TGTGCCTGG,V1,J1\n");
    }

    #[test]
    fn seq_type_names() {
        assert_eq!("ntseq".parse::<SeqType>().unwrap(), SeqType::Nucleotide);
        assert_eq!("amino_acid".parse::<SeqType>().unwrap(), SeqType::AminoAcid);
        assert!("protein".parse::<SeqType>().is_err());
    }

    #[test]
    fn csv_extension_uses_commas() {
        assert_eq!(default_delimiter(Some(Path::new("out.csv"))), b',');
        assert_eq!(default_delimiter(Some(Path::new("out.tsv"))), b'\t');
        assert_eq!(default_delimiter(None), b'\t');
    }
}
