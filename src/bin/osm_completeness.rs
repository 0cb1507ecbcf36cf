use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Parser;
use osm_completeness::completeness::RequiredTags;
use osm_completeness::output::SinkSet;
use osm_completeness::parser::CompletenessParser;
use osm_completeness::timer::Timer;
use osm_completeness::xml;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Osm xml file to analyze
    file: PathBuf,

    /// Json file mapping required tag keys to their allowed values
    #[clap(long)]
    rules: Option<PathBuf>,

    /// Directory receiving features.jsonl, points.jsonl and errors.jsonl
    #[clap(short, long, default_value = ".")]
    destination: PathBuf,
}

fn main() -> Result<(), String> {
    env_logger::init();

    let Args {
        file,
        rules,
        destination,
    } = Args::parse();

    let rules = if let Some(rules) = rules {
        let file = File::open(rules).map_err(|err| err.to_string())?;
        serde_json::from_reader(file).map_err(|err| err.to_string())?
    } else {
        RequiredTags::default()
    };

    let input = File::open(&file).map_err(|err| err.to_string())?;
    let sinks = SinkSet::in_dir(&destination).map_err(|err| err.to_string())?;

    let mut handler = Timer::wrap(CompletenessParser::new(rules, sinks));
    xml::read_document(BufReader::new(input), &mut handler).map_err(|err| err.to_string())?;
    handler.print();
    let parser = handler.unwrap();

    serde_json::to_writer(std::io::stdout(), &parser.stats).map_err(|err| err.to_string())?;
    println!();

    Ok(())
}
