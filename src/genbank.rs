use gb_io::reader::SeqReader;
use gb_io::seq::Seq;

use crate::domain::SeqRecord;
use crate::error::KiraError;

/// Parses one `efetch rettype=gb` page. A malformed entry fails the whole
/// page; `start` is only used for the error message.
pub fn parse_page(payload: &str, start: usize) -> Result<Vec<SeqRecord>, KiraError> {
    SeqReader::new(payload.as_bytes())
        .map(|entry| {
            entry
                .map(|seq| record_from_seq(&seq))
                .map_err(|err| KiraError::GenbankParse {
                    start,
                    message: err.to_string(),
                })
        })
        .collect()
}

pub fn record_from_seq(seq: &Seq) -> SeqRecord {
    SeqRecord {
        id: record_id(seq),
        length: sequence_length(seq),
        description: description(seq),
    }
}

/// VERSION accession, else ACCESSION, else the LOCUS name.
fn record_id(seq: &Seq) -> String {
    [&seq.version, &seq.accession, &seq.name]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .filter_map(|value| value.split_whitespace().next())
        .next()
        .unwrap_or("<unknown id>")
        .to_string()
}

// CONTIG-only entries carry no residues; the LOCUS length stands in.
fn sequence_length(seq: &Seq) -> usize {
    if seq.seq.is_empty() {
        seq.len.unwrap_or(0)
    } else {
        seq.seq.len()
    }
}

fn description(seq: &Seq) -> String {
    let definition = seq.definition.as_deref().unwrap_or("").trim();
    definition
        .strip_suffix('.')
        .unwrap_or(definition)
        .to_string()
}
