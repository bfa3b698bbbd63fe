// Parser for the IGoR-style marginals and params files

use crate::shared::gene::{Functionality, Gene};
use crate::shared::sequence::Dna;
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use log::warn;
use ndarray::{ArrayD, IxDyn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, Read};
use std::path::Path;
use std::str::FromStr;

static DIM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$Dim\[(\d+(?:,\s*\d+)*)\]$").expect("valid regex"));
static DEPENDENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?<text>\w+),\s*(?<number>\d+)\]").expect("valid regex"));

#[derive(Default, Clone, Debug)]
pub struct ParserMarginals {
    pub marginals: HashMap<String, Marginal>,
}

#[derive(Default, Clone, Debug)]
pub struct Marginal {
    pub dimensions: Vec<usize>,     // list of the dimensions
    pub dependences: Vec<String>,   // list of the other variables that Marginal depends on
    pub probabilities: ArrayD<f64>, // Array that contains all the probabilities of interest
}

// an event is either a gene or a # of insertion/deletion
#[derive(Clone, Debug)]
pub enum EventType {
    Genes(Vec<Gene>),
    Numbers(Vec<i64>),
}

impl EventType {
    pub fn to_genes(&self) -> Result<Vec<Gene>> {
        match self {
            EventType::Genes(v) => Ok(v.to_vec()),
            _ => Err(anyhow!("Wrong conversion for the EventType (not genes)"))?,
        }
    }

    pub fn to_numbers(&self) -> Result<Vec<i64>> {
        match self {
            EventType::Numbers(v) => Ok(v.to_vec()),
            _ => Err(anyhow!("Wrong conversion for the EventType (not numbers)"))?,
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct ParserParams {
    pub params: HashMap<String, EventType>,
    pub error_rate: f64,
}

impl Marginal {
    pub fn parse(str_data: &[String]) -> Result<(String, Marginal)> {
        if str_data.len() < 2 {
            return Err(anyhow!("Invalid file format."))?;
        }
        let key = str_data[0].trim_start_matches('@').to_string();
        let dimensions = parse_dim(&str_data[1])?;
        if dimensions.is_empty() || dimensions.iter().any(|&d| d == 0) {
            return Err(anyhow!("Invalid dimensions for the marginal {}", key));
        }
        let mut marg = Marginal {
            dimensions,
            ..Default::default()
        };
        // every line of values covers the last dimension
        let product = marg
            .dimensions
            .iter()
            .take(marg.dimensions.len() - 1)
            .product();
        marg.probabilities = ArrayD::zeros(IxDyn(&marg.dimensions));

        for ii in 0..product {
            let dependences_line = str_data
                .get(2 * ii + 2)
                .ok_or(anyhow!("Invalid file format for the marginal {}", key))?;
            let (dependences, indexes) = parse_dependence(dependences_line)?;
            if indexes.len() + 1 != marg.dimensions.len() {
                return Err(anyhow!("Invalid file format for the marginal {}", key));
            }
            if marg.dependences.is_empty() {
                marg.dependences = dependences;
            } else if marg.dependences != dependences {
                return Err(anyhow!("Invalid file format for the marginal {}", key));
            }

            let values_line = str_data
                .get(2 * ii + 3)
                .ok_or(anyhow!("Invalid file format for the marginal {}", key))?;
            let values = parse_values(values_line)
                .with_context(|| format!("Invalid values for the marginal {}", key))?;
            if values.len() != *marg.dimensions.last().unwrap_or(&0) {
                return Err(anyhow!(
                    "Wrong number of values for the marginal {} (expected {}, got {})",
                    key,
                    marg.dimensions.last().unwrap_or(&0),
                    values.len()
                ));
            }
            for (idx, val) in values.iter().enumerate() {
                let mut idxs = indexes.clone();
                idxs.push(idx);
                let cell = marg
                    .probabilities
                    .get_mut(&idxs[..])
                    .ok_or(anyhow!("Index out of bounds in the marginal {}", key))?;
                *cell = *val;
            }
        }

        Ok((key, marg))
    }
}

fn parse_genes(str_data: &[String]) -> Result<EventType> {
    let mut events: Vec<Option<Gene>> = vec![None; str_data.len()];
    for line in str_data {
        let data: Vec<&str> = line.split(';').collect();
        if data.len() != 3 {
            return Err(anyhow!("Invalid format for gene event {}", line));
        }
        let gene = Gene::new(
            data[0].trim_start_matches('%'),
            Dna::from_string(data[1])?,
            None, // not available from this file
            "",
        );
        let index = usize::from_str(data[2].trim())?;
        let slot = events
            .get_mut(index)
            .ok_or(anyhow!("Gene index {} out of range", index))?;
        *slot = Some(gene);
    }
    Ok(EventType::Genes(
        events
            .into_iter()
            .collect::<Option<Vec<Gene>>>()
            .ok_or(anyhow!("Gene indexes are not contiguous"))?,
    ))
}

fn parse_numbers(str_data: &[String]) -> Result<EventType> {
    let mut events: Vec<Option<i64>> = vec![None; str_data.len()];
    for line in str_data {
        let data: Vec<&str> = line.split(';').collect();
        if data.len() != 2 {
            return Err(anyhow!("Invalid format for numbered event {}", line));
        }
        let value = i64::from_str(data[0].trim_start_matches('%').trim())?;
        let index = usize::from_str(data[1].trim())?;
        let slot = events
            .get_mut(index)
            .ok_or(anyhow!("Event index {} out of range", index))?;
        *slot = Some(value);
    }
    Ok(EventType::Numbers(
        events
            .into_iter()
            .collect::<Option<Vec<i64>>>()
            .ok_or(anyhow!("Event indexes are not contiguous"))?,
    ))
}

impl ParserParams {
    pub fn parse(sections: Vec<Vec<String>>) -> Result<ParserParams> {
        let mut pp: ParserParams = Default::default();
        for s in sections {
            match s.first() {
                Some(string) => match string.as_str() {
                    "@Event_list" => pp.parse_event_list(&s),
                    "@Edges" => Ok(()),
                    "@ErrorRate" => {
                        pp.parse_error_rate(&s);
                        Ok(())
                    }
                    _ => Err(anyhow!("Invalid format: wrong key {}", string))?,
                },
                None => Err(anyhow!("Invalid format: empty vector".to_string()))?,
            }?;
        }
        if pp.params.is_empty() {
            return Err(anyhow!("Invalid format: no @Event_list section"));
        }
        Ok(pp)
    }

    /// Read the anchor csv file (gene name, anchor index, functionality) and
    /// attach the anchors to the genes of `gene_choice`.
    pub fn add_anchors_gene<R: Read>(&mut self, reader: R, gene_choice: &str) -> Result<()> {
        let mut rdr = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut anchors = HashMap::<String, (usize, Functionality)>::new();
        rdr.headers()
            .map_err(|_e| anyhow!("Error reading the anchor file headers"))?;
        for result in rdr.records() {
            let record = result.map_err(|e| anyhow!("Error reading the record {:?}", e))?;
            let gene_name = record
                .get(0)
                .ok_or(anyhow!("Missing gene name in the anchor file"))?;
            let anchor = record
                .get(1)
                .ok_or(anyhow!("Missing anchor for {}", gene_name))?;
            let anchor = usize::from_str(anchor)
                .map_err(|e| anyhow!("Invalid anchor for {}: {:?}", gene_name, e))?;
            let functional = Functionality::parse(record.get(2).unwrap_or(""));
            anchors.insert(gene_name.to_string(), (anchor, functional));
        }

        match self.params.get_mut(gene_choice) {
            Some(EventType::Genes(v)) => {
                for g in v.iter_mut() {
                    match anchors.get(&g.name) {
                        Some((anchor, functional)) => {
                            g.cdr3_pos = Some(*anchor);
                            g.functional = *functional;
                        }
                        None => warn!("{} not found in the anchor file, it cannot be used", g.name),
                    }
                }
            }
            _ => return Err(anyhow!("Wrong value for gene_choice (add_anchors_gene)"))?,
        }
        Ok(())
    }

    fn parse_event(&mut self, str_data: &[String]) -> Result<()> {
        let name = str_data.first().ok_or(anyhow!("Invalid file format"))?;
        let key = name
            .split(';')
            .last()
            .ok_or(anyhow!("Invalid file format, {}", name))?
            .trim()
            .to_string();
        // list of genes
        if name.starts_with("#GeneChoice") {
            self.params.insert(key, parse_genes(&str_data[1..])?);
        } else if name.starts_with("#Deletion") | name.starts_with("#Insertion") {
            self.params.insert(key, parse_numbers(&str_data[1..])?);
        } else if name.starts_with("#DinucMarkov") {
            // Nothing, the nucleotide order is fixed (ACGT)
        } else {
            return Err(anyhow!("Invalid format, wrong key in the Event_list: {}", name))?;
        }
        Ok(())
    }

    fn parse_error_rate(&mut self, str_data: &[String]) {
        // The generated sequences carry no error, the rate is only informative
        self.error_rate = str_data
            .iter()
            .rev()
            .find_map(|l| l.parse::<f64>().ok())
            .unwrap_or_else(|| {
                warn!("Could not read the error rate, assuming 0");
                0.
            });
    }

    fn parse_event_list(&mut self, str_data: &[String]) -> Result<()> {
        let mut events: Vec<Vec<String>> = Vec::new();
        for line in str_data.iter().skip(1) {
            match line.chars().next() {
                Some('#') => {
                    let vec = vec![line.to_string()];
                    events.push(vec);
                }
                None => continue,
                _ => match events.last_mut() {
                    Some(ref mut v) => v.push(line.to_string()),
                    None => return Err(anyhow!("Invalid file format: error with the first line"))?,
                },
            }
        }
        for ev in events {
            self.parse_event(&ev)?;
        }
        Ok(())
    }

    /// Return the numbered event `key` (deletions/insertions)
    pub fn numbers(&self, key: &str) -> Result<Vec<i64>> {
        self.params
            .get(key)
            .ok_or(anyhow!("Missing event {} in the params file", key))?
            .to_numbers()
    }

    /// Return the gene event `key`
    pub fn genes(&self, key: &str) -> Result<Vec<Gene>> {
        self.params
            .get(key)
            .ok_or(anyhow!("Missing event {} in the params file", key))?
            .to_genes()
    }
}

impl ParserMarginals {
    pub fn parse(sections: Vec<Vec<String>>) -> Result<ParserMarginals> {
        let mut pm: ParserMarginals = Default::default();
        for s in sections {
            match s.first() {
                Some(_) => {
                    let (key, marg) = Marginal::parse(&s)?;
                    pm.marginals.insert(key, marg);
                }
                None => return Err(anyhow!("Invalid format: empty vector"))?,
            };
        }
        Ok(pm)
    }

    pub fn load(filename: &Path) -> Result<ParserMarginals> {
        Self::parse(parse_file(filename)?)
    }

    pub fn get(&self, key: &str) -> Result<&Marginal> {
        self.marginals
            .get(key)
            .ok_or(anyhow!("Missing marginal {} in the marginals file", key))
    }
}

fn split_sections<I: Iterator<Item = String>>(lines: I) -> Result<Vec<Vec<String>>> {
    let mut sections: Vec<Vec<String>> = Vec::new();
    for line in lines {
        let line = line.trim();
        match line.chars().next() {
            Some('@') => {
                let vec = vec![line.to_string()];
                sections.push(vec);
            }
            None => continue,
            _ => match sections.last_mut() {
                Some(ref mut v) => v.push(line.to_string()),
                None => return Err(anyhow!("Invalid file format: error with the first line")),
            },
        }
    }
    Ok(sections)
}

pub fn parse_file(filename: &Path) -> Result<Vec<Vec<String>>> {
    let file = File::open(filename).map_err(|_| anyhow!("Unable to open file"))?;
    let reader = io::BufReader::new(file);
    let lines = reader
        .lines()
        .collect::<Result<Vec<String>, _>>()
        .map_err(|_| anyhow!("Invalid file format: error reading line"))?;
    split_sections(lines.into_iter())
}

pub fn parse_str(data: &str) -> Result<Vec<Vec<String>>> {
    split_sections(data.lines().map(String::from))
}

fn parse_dim(s: &str) -> Result<Vec<usize>> {
    let caps = DIM_REGEX
        .captures(s)
        .ok_or(anyhow!("Invalid format: {}", s))?;
    caps[1]
        .split(',')
        .map(|num| usize::from_str(num.trim()).map_err(|e| anyhow!("{}: {}", s, e)))
        .collect()
}

fn parse_dependence(s: &str) -> Result<(Vec<String>, Vec<usize>)> {
    // Parse lines like "#[v_choice,0],[j_choice,6]" return ["v_choice", "j_choice"] and [0, 6]
    if s == "#" {
        return Ok((Vec::new(), Vec::new()));
    }
    let mut texts = Vec::new();
    let mut numbers = Vec::new();

    for dep_str in s.split('[').skip(1) {
        let caps = DEPENDENCE_REGEX
            .captures(dep_str)
            .ok_or(anyhow!("Invalid format: {}", s))?;
        texts.push(caps["text"].to_string());
        numbers.push(usize::from_str(&caps["number"])?);
    }
    Ok((texts, numbers))
}

fn parse_values(s: &str) -> Result<Vec<f64>> {
    s.trim_start_matches('%')
        .split(',')
        .map(|num_str| num_str.trim()) // Trim whitespace around the numbers
        .filter(|num_str| !num_str.is_empty())
        .map(|num_str| {
            num_str
                .parse::<f64>()
                .map_err(|_| anyhow!("Failed to parse '{}'", num_str))
        })
        .collect()
}
