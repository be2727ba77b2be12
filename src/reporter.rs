//! Reporter FASTA parsing and GTF synthesis.
//!
//! A reporter is a synthetic construct (e.g. a fluorescent protein) added to
//! the reference as its own contig. Each one is annotated as a single-exon
//! gene spanning the whole contig on the forward strand:
//!
//! ```text
//! RFP  reporter  gene        1  8  .  +  .  gene_id "RFP"; gene_name "RFP"; gene_biotype "reporter";
//! RFP  reporter  transcript  1  8  .  +  .  gene_id "RFP"; transcript_id "RFP"; ...
//! RFP  reporter  exon        1  8  .  +  .  gene_id "RFP"; transcript_id "RFP"; ...
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;

use crate::error::{RefbuildError, Result};

/// Value used for both the source column and `gene_biotype`.
pub const REPORTER_SOURCE: &str = "reporter";

/// One reporter sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reporter {
    pub name: String,
    pub sequence: String,
}

/// Parse reporters from FASTA text.
///
/// A header is a line beginning with `>`; its name is the first
/// whitespace-delimited token after the `>`. Sequence lines are upper-cased
/// and concatenated; blank lines are skipped. A name that appears twice keeps
/// its first position but takes the later sequence.
///
/// # Errors
/// `MalformedInput` for sequence data before the first header, for a header
/// with no name, or for a header followed by no sequence.
pub fn parse_reporters<R: BufRead>(reader: R) -> Result<Vec<Reporter>> {
    let mut reporters: Vec<Reporter> = Vec::new();
    // (index into `reporters`, line number of its header)
    let mut current: Option<(usize, usize)> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            close_reporter(&reporters, current)?;

            let name = header
                .split_whitespace()
                .next()
                .ok_or_else(|| RefbuildError::MalformedInput {
                    line: line_no,
                    msg: "header has no name".into(),
                })?;

            let pos = match reporters.iter().position(|r| r.name == name) {
                Some(pos) => {
                    warn!("reporter '{}' appears more than once, keeping the last sequence", name);
                    reporters[pos].sequence.clear();
                    pos
                }
                None => {
                    reporters.push(Reporter {
                        name: name.to_string(),
                        sequence: String::new(),
                    });
                    reporters.len() - 1
                }
            };
            current = Some((pos, line_no));
            continue;
        }

        let Some((pos, _)) = current else {
            return Err(RefbuildError::MalformedInput {
                line: line_no,
                msg: "sequence data before the first header".into(),
            });
        };
        reporters[pos].sequence.push_str(&line.trim().to_ascii_uppercase());
    }

    close_reporter(&reporters, current)?;
    Ok(reporters)
}

fn close_reporter(reporters: &[Reporter], current: Option<(usize, usize)>) -> Result<()> {
    match current {
        Some((pos, header_line)) if reporters[pos].sequence.is_empty() => {
            Err(RefbuildError::MalformedInput {
                line: header_line,
                msg: format!("reporter '{}' has no sequence", reporters[pos].name),
            })
        }
        _ => Ok(()),
    }
}

/// Parse reporters from a FASTA file.
pub fn read_reporters(path: &Path) -> Result<Vec<Reporter>> {
    let file = File::open(path).map_err(RefbuildError::io_at(path))?;
    parse_reporters(BufReader::new(file))
}

/// A single GTF line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GtfRecord {
    pub seqname: String,
    pub source: String,
    pub feature: String,
    pub start: u64,
    pub end: u64,
    pub score: Option<String>,
    pub strand: char,
    pub frame: Option<u8>,
    pub attributes: Vec<(String, String)>,
}

impl GtfRecord {
    /// Render as a tab-separated line, without the newline.
    ///
    /// Attributes are written as `key "value"` joined by `"; "` and closed
    /// with a trailing `;`.
    pub fn to_line(&self) -> String {
        let attributes = self
            .attributes
            .iter()
            .map(|(k, v)| format!("{} \"{}\"", k, v))
            .collect::<Vec<_>>()
            .join("; ");

        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{};",
            self.seqname,
            self.source,
            self.feature,
            self.start,
            self.end,
            self.score.as_deref().unwrap_or("."),
            self.strand,
            self.frame.map_or_else(|| ".".to_string(), |f| f.to_string()),
            attributes,
        )
    }
}

/// The gene, transcript and exon records for one reporter, in that order.
pub fn reporter_gtf_records(reporter: &Reporter) -> [GtfRecord; 3] {
    let name = reporter.name.as_str();
    let base = |feature: &str, with_transcript: bool| {
        let mut attributes = vec![("gene_id".to_string(), name.to_string())];
        if with_transcript {
            attributes.push(("transcript_id".to_string(), name.to_string()));
        }
        attributes.push(("gene_name".to_string(), name.to_string()));
        attributes.push(("gene_biotype".to_string(), REPORTER_SOURCE.to_string()));

        GtfRecord {
            seqname: name.to_string(),
            source: REPORTER_SOURCE.to_string(),
            feature: feature.to_string(),
            start: 1,
            end: reporter.sequence.len() as u64,
            score: None,
            strand: '+',
            frame: None,
            attributes,
        }
    };

    [
        base("gene", false),
        base("transcript", true),
        base("exon", true),
    ]
}

/// Write GTF lines for `reporters` to `out`, in order.
pub fn write_reporter_gtf_to<W: Write>(reporters: &[Reporter], mut out: W) -> Result<()> {
    for reporter in reporters {
        for record in reporter_gtf_records(reporter) {
            writeln!(out, "{}", record.to_line())?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Write GTF lines for `reporters` to a new file at `path`.
pub fn write_reporter_gtf(reporters: &[Reporter], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(RefbuildError::io_at(path))?;
    write_reporter_gtf_to(reporters, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Vec<Reporter>> {
        parse_reporters(s.as_bytes())
    }

    #[test]
    fn parses_multiline_sequences() {
        let r = parse(">RFP some description\natgc\nATGC\n\n>GFP\nggg\n").unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].name, "RFP");
        assert_eq!(r[0].sequence, "ATGCATGC");
        assert_eq!(r[1].name, "GFP");
        assert_eq!(r[1].sequence, "GGG");
    }

    #[test]
    fn header_name_is_trimmed() {
        let r = parse(">  mCherry\tconstruct v2\nAC\n").unwrap();
        assert_eq!(r[0].name, "mCherry");
    }

    #[test]
    fn sequence_before_header_is_rejected() {
        match parse("\nACGT\n>RFP\nAC\n") {
            Err(RefbuildError::MalformedInput { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn empty_header_is_rejected() {
        assert!(matches!(
            parse(">\nACGT\n"),
            Err(RefbuildError::MalformedInput { line: 1, .. })
        ));
    }

    #[test]
    fn duplicate_name_keeps_position_and_last_sequence() {
        let r = parse(">A\nAAAA\n>B\nCC\n>A\nGG\n").unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r[0], Reporter { name: "A".into(), sequence: "GG".into() });
        assert_eq!(r[1].name, "B");
    }

    #[test]
    fn header_without_sequence_is_rejected() {
        match parse(">EMPTY\n>B\nAC\n") {
            Err(RefbuildError::MalformedInput { line, msg }) => {
                assert_eq!(line, 1);
                assert!(msg.contains("EMPTY"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn trailing_header_without_sequence_is_rejected() {
        assert!(matches!(
            parse(">A\nAC\n\n>B\n\n"),
            Err(RefbuildError::MalformedInput { line: 4, .. })
        ));
    }

    #[test]
    fn indented_gt_is_not_a_header() {
        assert!(matches!(
            parse("  >X\nACGT\n"),
            Err(RefbuildError::MalformedInput { line: 1, .. })
        ));
    }

    #[test]
    fn empty_input_has_no_reporters() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n").unwrap().is_empty());
    }

    #[test]
    fn gene_line_layout() {
        let rep = Reporter { name: "RFP".into(), sequence: "ATGCATGC".into() };
        let [gene, transcript, exon] = reporter_gtf_records(&rep);
        assert_eq!(
            gene.to_line(),
            "RFP\treporter\tgene\t1\t8\t.\t+\t.\tgene_id \"RFP\"; gene_name \"RFP\"; gene_biotype \"reporter\";"
        );
        assert_eq!(
            transcript.to_line(),
            "RFP\treporter\ttranscript\t1\t8\t.\t+\t.\tgene_id \"RFP\"; transcript_id \"RFP\"; gene_name \"RFP\"; gene_biotype \"reporter\";"
        );
        assert_eq!(exon.feature, "exon");
        assert_eq!(exon.to_line().split('\t').count(), 9);
    }

    #[test]
    fn three_lines_per_reporter_in_order() {
        let reps = parse(">A\nAC\n>B\nACG\n>C\nA\n").unwrap();
        let mut buf = Vec::new();
        write_reporter_gtf_to(&reps, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);

        let features: Vec<(&str, &str)> = lines
            .iter()
            .map(|l| {
                let cols: Vec<&str> = l.split('\t').collect();
                (cols[0], cols[2])
            })
            .collect();
        assert_eq!(
            features,
            vec![
                ("A", "gene"), ("A", "transcript"), ("A", "exon"),
                ("B", "gene"), ("B", "transcript"), ("B", "exon"),
                ("C", "gene"), ("C", "transcript"), ("C", "exon"),
            ]
        );
    }

    #[test]
    fn no_reporters_writes_nothing() {
        let mut buf = Vec::new();
        write_reporter_gtf_to(&[], &mut buf).unwrap();
        assert!(buf.is_empty());
    }
}
