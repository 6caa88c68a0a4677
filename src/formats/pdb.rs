//! PDB file format parser
//!
//! Parser for Protein Data Bank (PDB) files. Returns flat atom data plus the
//! model id of every atom. A coordinate record that cannot be read is an
//! error: silently dropping atoms would shift residue centroids.
//!
//! # Examples
//! ```no_run
//! use protein_graph::formats::pdb::parse_pdb_file;
//! let (data, model_ids) = parse_pdb_file("data/pdb/1ABC.pdb").unwrap();
//! ```

use crate::structure::{AtomRecord, RawAtomData};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
    #[error("No atoms found in PDB file")]
    NoAtoms,
}

/// Fixed-width field, `None` if the line is too short
fn field(line: &str, start: usize, end: usize) -> Option<&str> {
    line.get(start..end.min(line.len())).filter(|s| !s.is_empty())
}

/// Parse a PDB ATOM/HETATM line using fixed-width fields
/// Format: https://www.wwpdb.org/documentation/file-format-content/format33/sect9.html
fn parse_atom_line(line: &str) -> Result<AtomRecord, String> {
    if line.len() < 54 {
        return Err(format!("record too short ({} columns)", line.len()));
    }

    let record_type = field(line, 0, 6).unwrap_or_default().trim();
    if record_type != "ATOM" && record_type != "HETATM" {
        return Err(format!("not a coordinate record: '{}'", record_type));
    }

    let parse_f32 = |name: &str, start: usize, end: usize| -> Result<f32, String> {
        let raw = field(line, start, end).ok_or_else(|| format!("missing {}", name))?;
        raw.trim()
            .parse::<f32>()
            .map_err(|_| format!("invalid {} '{}'", name, raw.trim()))
    };

    let parse_i32 = |name: &str, start: usize, end: usize| -> Result<i32, String> {
        let raw = field(line, start, end).ok_or_else(|| format!("missing {}", name))?;
        raw.trim()
            .parse::<i32>()
            .map_err(|_| format!("invalid {} '{}'", name, raw.trim()))
    };

    let text = |start: usize, end: usize| -> String {
        field(line, start, end).unwrap_or_default().trim().to_string()
    };

    let char_at = |idx: usize| line.chars().nth(idx).unwrap_or(' ');

    Ok(AtomRecord {
        atom_name: text(12, 16),
        alt_loc: char_at(16),
        res_name: text(17, 20),
        chain_id: text(21, 22),
        res_seq: parse_i32("residue number", 22, 26)?,
        i_code: char_at(26),
        coord: [
            parse_f32("x coordinate", 30, 38)?,
            parse_f32("y coordinate", 38, 46)?,
            parse_f32("z coordinate", 46, 54)?,
        ],
    })
}

/// Parse PDB records from any buffered reader.
/// Returns raw atom data and the model id of every atom.
pub fn parse_pdb_reader<R: BufRead>(reader: R) -> Result<(RawAtomData, Vec<usize>), PdbError> {
    let mut raw_data = RawAtomData::new();
    let mut model_ids: Vec<usize> = Vec::new();
    let mut current_model: usize = 1; // Default model 1 if no MODEL record

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;

        if line.starts_with("MODEL") {
            if let Some(model_str) = line.get(10..) {
                if let Ok(model_num) = model_str.trim().parse::<usize>() {
                    current_model = model_num;
                }
            }
        } else if line.starts_with("ATOM") || line.starts_with("HETATM") {
            let atom = parse_atom_line(&line).map_err(|reason| PdbError::MalformedRecord {
                line: line_no + 1,
                reason,
            })?;
            raw_data.push(atom);
            model_ids.push(current_model);
        }
    }

    if raw_data.is_empty() {
        return Err(PdbError::NoAtoms);
    }

    Ok((raw_data, model_ids))
}

/// Parse PDB text held in memory
pub fn parse_pdb_str(text: &str) -> Result<(RawAtomData, Vec<usize>), PdbError> {
    parse_pdb_reader(text.as_bytes())
}

/// Parse PDB file and return raw atom data with model IDs.
pub fn parse_pdb_file<P: AsRef<Path>>(path: P) -> Result<(RawAtomData, Vec<usize>), PdbError> {
    let file = File::open(path)?;
    parse_pdb_reader(BufReader::new(file))
}
