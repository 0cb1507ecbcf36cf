use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::completeness::RequiredTags;
use crate::output::{Sink, SinkError, SinkSet};
use crate::parser::{CompletenessParser, Stats};

pub mod completeness;
pub mod element;
pub mod emit;
pub mod output;
pub mod parser;
pub mod timer;
pub mod xml;

/// Everything needed for one [analyze_file] run
#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    /// Osm xml document to analyze
    pub file: PathBuf,
    /// Rules the elements are scored against
    pub rules: RequiredTags,
    /// Directory receiving the three output files
    pub destination: PathBuf,
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("failed to open {path:?}")]
    Open {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Read(#[from] xml::ReadError),
}

/// Run the analyzer over `input`, writing into `sinks`
///
/// The returned parser carries the run's [Stats] and the finished sinks.
pub fn analyze<R, S>(
    input: R,
    rules: RequiredTags,
    sinks: SinkSet<S>,
) -> Result<CompletenessParser<S>, xml::ReadError>
where
    R: BufRead,
    S: Sink,
{
    let mut parser = CompletenessParser::new(rules, sinks);
    xml::read_document(input, &mut parser)?;
    Ok(parser)
}

/// Analyze a file, writing the three standard json line files
pub fn analyze_file(config: Config) -> Result<Stats, AnalyzeError> {
    let Config {
        file,
        rules,
        destination,
    } = config;

    let input = File::open(&file).map_err(|source| AnalyzeError::Open { source, path: file })?;
    let sinks = SinkSet::in_dir(&destination)?;

    let parser = analyze(BufReader::new(input), rules, sinks)?;
    Ok(parser.stats)
}
