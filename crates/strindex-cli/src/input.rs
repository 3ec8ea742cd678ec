use std::io::BufRead;

use anyhow::{Context, anyhow};
use strindex::{KeyCollection, OrgId, UseCase};

/// Splits off the first whitespace-delimited field and returns it with the
/// remainder, leading whitespace removed.
fn next_field(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    let end = line.find(char::is_whitespace)?;
    Some((&line[..end], line[end..].trim_start()))
}

/// Reads `use_case org_id string` lines into one collection.
///
/// The string is everything after the org id and the whitespace that follows
/// it, kept verbatim up to the line terminator. Blank lines and lines starting
/// with `#` are skipped.
pub fn parse_requests(reader: impl BufRead) -> anyhow::Result<KeyCollection> {
    let mut keys = KeyCollection::new();
    for (index, line) in reader.lines().enumerate() {
        let lineno = index + 1;
        let line = line.with_context(|| format!("failed to read line {lineno}"))?;
        let content = line.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let (use_case, rest) =
            next_field(&line).ok_or_else(|| anyhow!("line {lineno}: expected `use_case org_id string`"))?;
        let (org_id, string) =
            next_field(rest).ok_or_else(|| anyhow!("line {lineno}: expected `use_case org_id string`"))?;

        let use_case: UseCase = use_case.parse().with_context(|| format!("line {lineno}"))?;
        let org_id: OrgId = org_id.parse().with_context(|| format!("line {lineno}"))?;
        keys.add(use_case, org_id, [string])
            .with_context(|| format!("line {lineno}"))?;
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aligned_columns_and_skips_comments() {
        let input = "\
# use_case     org  string
transactions   1    latency_ms

sessions       2    release name
  spans 3 db.query
transactions   1    latency_ms
";
        let keys = parse_requests(input.as_bytes()).unwrap();
        assert_eq!(keys.size(), 3);
        assert!(keys.contains(UseCase::Transactions, OrgId::new(1), "latency_ms"));
        assert!(keys.contains(UseCase::Sessions, OrgId::new(2), "release name"));
        assert!(keys.contains(UseCase::Spans, OrgId::new(3), "db.query"));
    }

    #[test]
    fn trailing_whitespace_is_part_of_the_string() {
        let keys = parse_requests(&b"spans 1 foo  \r\nspans 1 foo\n"[..]).unwrap();
        assert_eq!(keys.size(), 2);
        assert!(keys.contains(UseCase::Spans, OrgId::new(1), "foo  "));
        assert!(keys.contains(UseCase::Spans, OrgId::new(1), "foo"));
    }

    #[test]
    fn empty_input_is_empty_collection() {
        assert!(parse_requests(&b""[..]).unwrap().is_empty());
        assert!(parse_requests(&b"# nothing\n\n"[..]).unwrap().is_empty());
    }

    #[test]
    fn errors_name_the_line() {
        let err = parse_requests(&b"sessions 1 a\nmetrics 1 b\n"[..]).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = parse_requests(&b"sessions -4 a\n"[..]).unwrap_err();
        assert!(err.to_string().contains("line 1"));

        let err = parse_requests(&b"sessions 1\n"[..]).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
