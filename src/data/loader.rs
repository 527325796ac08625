// ============================================================
// Layer 4 — WMT Dataset Reader
// ============================================================
// Reads the combined WMT metrics dataset: a UTF-8 text file with
// one labelled sentence pair per line, four tab-separated columns:
//
//   mt sentence \t reference sentence \t human score \t origin
//
// e.g.
//   the cat sat on mat \t the cat sat on the mat \t 0.42 \t newstest2016
//
// Sentences are tokenised by splitting on whitespace. Blank lines
// are skipped; any other malformed line is an error that names the
// line number, because silently dropping labelled rows would skew
// the fold proportions.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (Reading a File)

use anyhow::{bail, Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::instance::WmtInstance;
use crate::domain::traits::InstanceSource;

/// Reads WmtInstances from a tab-separated file.
pub struct WmtTsvReader {
    path: PathBuf,
}

impl WmtTsvReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InstanceSource for WmtTsvReader {
    fn read_all(&self) -> Result<Vec<WmtInstance>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read dataset '{}'", self.path.display()))?;

        let instances = parse_tsv(&text)
            .with_context(|| format!("Malformed dataset '{}'", self.path.display()))?;

        tracing::info!(
            "Read {} instances from '{}'",
            instances.len(),
            self.path.display()
        );
        Ok(instances)
    }
}

/// Parse the whole file body. Line numbers in errors are 1-based.
pub fn parse_tsv(text: &str) -> Result<Vec<WmtInstance>> {
    let mut instances = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let instance = parse_line(line).with_context(|| format!("line {}", i + 1))?;
        instances.push(instance);
    }
    Ok(instances)
}

/// Parse one `mt \t ref \t score \t origin` row.
pub fn parse_line(line: &str) -> Result<WmtInstance> {
    let line   = line.trim_end_matches(&['\r', '\n'][..]);
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 4 {
        bail!("expected 4 tab-separated columns, found {}", fields.len());
    }

    let score: f64 = fields[2]
        .trim()
        .parse()
        .with_context(|| format!("invalid human score '{}'", fields[2]))?;
    if !score.is_finite() {
        bail!("human score must be finite, got '{}'", fields[2]);
    }

    Ok(WmtInstance::new(fields[0], fields[1], score, fields[3].trim()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_line() {
        let inst = parse_line("a small cat\tthe small cat\t-0.25\tnewstest2015").unwrap();
        assert_eq!(inst.mt, vec!["a", "small", "cat"]);
        assert_eq!(inst.reference, vec!["the", "small", "cat"]);
        assert_eq!(inst.human_score, -0.25);
        assert_eq!(inst.origin(), Some("newstest2015"));
    }

    #[test]
    fn test_parse_line_rejects_bad_rows() {
        assert!(parse_line("only\tthree\t0.1").is_err());
        assert!(parse_line("a\tb\tnot-a-number\twmt").is_err());
        assert!(parse_line("a\tb\tNaN\twmt").is_err());
    }

    #[test]
    fn test_parse_tsv_skips_blank_lines_and_reports_line() {
        let body = "a\tb\t0.1\tx\n\n c\td\t0.2\ty\r\n";
        let all  = parse_tsv(body).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].origin(), Some("y"));

        let err = parse_tsv("a\tb\t0.1\tx\nbroken\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_reader_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mt one\tref one\t0.5\twmt16").unwrap();
        writeln!(file, "mt two\tref two\t0.7\twmt17").unwrap();

        let reader = WmtTsvReader::new(file.path());
        let all    = reader.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].human_score, 0.5);
    }

    #[test]
    fn test_reader_missing_file_is_error() {
        let reader = WmtTsvReader::new("/definitely/not/here.tsv");
        assert!(reader.read_all().is_err());
    }
}
