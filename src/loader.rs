use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::num::ParseFloatError;
use std::path::Path;

use thiserror::Error;

use crate::model::entity::{EntityRecord, Measure};
use crate::model::population::Population;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}, column {column}: {value:?} is not a number")]
    Parse {
        line: usize,
        column: usize,
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("line {line} has {found} fields, expected {expected}")]
    RaggedLine { line: usize, expected: usize, found: usize },
}

/// Reads tab-separated measurement vectors, one record per non-blank line.
/// Every field becomes an output; ids are sequential from `"0"`. Any bad
/// line fails the whole read.
pub fn read_population<R: BufRead>(reader: R) -> Result<Population, LoadError> {
    let mut population = Population::new();
    let mut width = None;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let outputs = parse_line(line, index + 1)?;
        let expected = *width.get_or_insert(outputs.len());
        if outputs.len() != expected {
            return Err(LoadError::RaggedLine { line: index + 1, expected, found: outputs.len() });
        }
        let id = population.len().to_string();
        population.insert(EntityRecord::outputs_only(id, outputs));
    }
    Ok(population)
}

pub fn read_population_file(path: impl AsRef<Path>) -> Result<Population, LoadError> {
    let file = File::open(path)?;
    read_population(BufReader::new(file))
}

fn parse_line(line: &str, line_number: usize) -> Result<Vec<Measure>, LoadError> {
    line.split('\t')
        .enumerate()
        .map(|(column, field)| {
            let field = field.trim();
            field.parse::<Measure>().map_err(|source| LoadError::Parse {
                line: line_number,
                column: column + 1,
                value: field.to_string(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_sequential_records() {
        let population = read_population(Cursor::new("1\t2\t3\n4\t5\t6\n")).unwrap();
        assert_eq!(population.len(), 2);
        assert_eq!(population.get("0").unwrap().outputs, vec![1.0, 2.0, 3.0]);
        assert_eq!(population.get("1").unwrap().outputs, vec![4.0, 5.0, 6.0]);
        assert!(population.get("1").unwrap().inputs.is_empty());
    }

    #[test]
    fn skips_blank_lines_and_trims() {
        let population = read_population(Cursor::new("  1\t2 \n\n3\t4\r\n")).unwrap();
        assert_eq!(population.len(), 2);
        assert_eq!(population.get("1").unwrap().outputs, vec![3.0, 4.0]);
    }

    #[test]
    fn malformed_field_fails_the_load() {
        let err = read_population(Cursor::new("1\t2\t3\n4\tfive\t6\n")).unwrap_err();
        match err {
            LoadError::Parse { line, column, value, .. } => {
                assert_eq!((line, column, value.as_str()), (2, 2, "five"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ragged_lines_fail_the_load() {
        let err = read_population(Cursor::new("1\t2\t3\n4\t5\n")).unwrap_err();
        assert!(matches!(err, LoadError::RaggedLine { line: 2, expected: 3, found: 2 }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_population_file("/nonexistent/socialcounts.tsv").unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
