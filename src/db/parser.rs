//! Line-oriented parser for the OS fingerprint database format
//!
//! The format is a sequence of records separated by blank lines. A record
//! opens with `Fingerprint <name>` (a reference entry) or `MatchPoints`
//! (the unique point-budget entry) and continues with `Class`, `CPE` and
//! test lines. Syntax errors abort only the offending record, which is
//! logged with its line number and dropped; errors the scoring invariants
//! depend on are fatal.

use log::warn;

use crate::error::{OsDbError, OsDbResult};
use crate::expr::Expr;
use crate::fingerprint::{AVal, FingerPrint, FingerTest, OsClassification};
use crate::intern::StringPool;

/// A record-level failure: either local (drop the record, keep parsing)
/// or one of the fatal database errors.
enum RecordError {
    Syntax(String),
    Fatal(OsDbError),
}

enum Header<'a> {
    Fingerprint(&'a str),
    MatchPoints,
}

fn parse_header(line: &str) -> Option<Header<'_>> {
    if let Some(rest) = line.strip_prefix("Fingerprint") {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return Some(Header::Fingerprint(rest));
        }
    } else if let Some(rest) = line.strip_prefix("MatchPoints") {
        if rest.trim().is_empty() {
            return Some(Header::MatchPoints);
        }
    }
    None
}

/// Parse `vendor|family|generation|device_type`. The generation field is
/// special: when empty after trimming it is recorded as absent.
fn parse_class(pool: &mut StringPool, rest: &str) -> Option<OsClassification> {
    let mut parts = rest.splitn(4, '|');
    let vendor = parts.next()?;
    let family = parts.next()?;
    let generation = parts.next()?;
    let device_type = parts.next()?;

    let generation = generation.trim();
    Some(OsClassification {
        vendor: pool.intern_trimmed(vendor),
        family: pool.intern_trimmed(family),
        generation: if generation.is_empty() {
            None
        } else {
            Some(pool.intern(generation))
        },
        device_type: pool.intern_trimmed(device_type),
        cpe: Vec::new(),
    })
}

/// Parse `NAME(attr=val%attr=val...)`. Anything past the closing
/// parenthesis is ignored; an empty body yields a test with no results.
fn parse_test_line(pool: &mut StringPool, line: &str) -> Option<FingerTest> {
    let open = line.find('(')?;
    let close = open + line[open..].find(')')?;
    let name = &line[..open];
    let body = &line[open + 1..close];

    let mut test = FingerTest::new(pool.intern(name));
    if !body.is_empty() {
        for segment in body.split('%') {
            let (attribute, value) = segment.split_once('=')?;
            test.results
                .push(AVal::new(pool.intern(attribute), pool.intern(value)));
        }
    }
    Some(test)
}

struct DbParser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    pool: StringPool,
    prints: Vec<FingerPrint>,
    match_points: Option<FingerPrint>,
}

impl<'a> DbParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
            pool: StringPool::new(),
            prints: Vec::new(),
            match_points: None,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    /// 1-based number of the line `peek` would return.
    fn lineno(&self) -> usize {
        self.pos + 1
    }

    fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    /// Consume the remainder of an aborted record, up to and including the
    /// blank line that ends it.
    fn skip_record(&mut self) {
        while let Some(line) = self.advance() {
            if line.trim().is_empty() {
                break;
            }
        }
    }

    fn finish_record(&mut self, mut fp: FingerPrint, is_points: bool) {
        // Sorting establishes the canonical form later comparison of
        // fingerprints and tests relies on.
        fp.sort();
        if is_points {
            self.match_points = Some(fp);
        } else {
            self.prints.push(fp);
        }
    }

    fn run(&mut self) -> OsDbResult<()> {
        while let Some(line) = self.peek() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.advance();
                continue;
            }
            if parse_header(trimmed).is_some() {
                self.parse_record()?;
            } else {
                warn!(
                    "Parse error on line {} of OS database: {}",
                    self.lineno(),
                    trimmed
                );
                self.advance();
            }
        }
        Ok(())
    }

    /// Parse one record starting at the current header line. A second
    /// `Fingerprint` keyword inside the body finishes the current entry
    /// and starts the next one.
    fn parse_record(&mut self) -> OsDbResult<()> {
        let mut header_lineno = self.lineno();
        let mut header_line = self.advance().expect("caller checked a header is present");

        'record: loop {
            let header = parse_header(header_line.trim())
                .expect("caller and record loop only hand over header lines");

            let mut fp = FingerPrint::new();
            fp.line = header_lineno;
            let is_points = match header {
                Header::MatchPoints => {
                    if self.match_points.is_some() {
                        return Err(OsDbError::DuplicateMatchPoints(header_lineno));
                    }
                    true
                }
                Header::Fingerprint(rest) => {
                    // A trailing '#' comment terminates the display name.
                    let name = rest.split('#').next().unwrap_or("").trim();
                    if name.is_empty() {
                        warn!(
                            "Parse error on line {} of OS database: Fingerprint record without a name",
                            header_lineno
                        );
                        self.skip_record();
                        return Ok(());
                    }
                    fp.name = Some(self.pool.intern(name));
                    false
                }
            };

            loop {
                let Some(raw) = self.peek() else {
                    break; // EOF ends the record
                };
                let line = raw.trim();
                let lineno = self.lineno();

                if line.is_empty() {
                    self.advance();
                    break;
                }
                if line.starts_with('#') {
                    self.advance();
                    continue;
                }
                if line.starts_with("Fingerprint ") {
                    self.finish_record(fp, is_points);
                    header_lineno = lineno;
                    header_line = self.advance().expect("peeked above");
                    continue 'record;
                }

                self.advance();
                match self.parse_body_line(&mut fp, line, lineno, is_points) {
                    Ok(()) => {}
                    Err(RecordError::Fatal(e)) => return Err(e),
                    Err(RecordError::Syntax(text)) => {
                        warn!("Parse error on line {} of OS database: {}", lineno, text);
                        self.skip_record();
                        return Ok(());
                    }
                }
            }

            self.finish_record(fp, is_points);
            return Ok(());
        }
    }

    fn parse_body_line(
        &mut self,
        fp: &mut FingerPrint,
        line: &str,
        lineno: usize,
        is_points: bool,
    ) -> Result<(), RecordError> {
        if let Some(rest) = line.strip_prefix("Class ") {
            let class = parse_class(&mut self.pool, rest)
                .ok_or_else(|| RecordError::Syntax(line.to_string()))?;
            fp.classes.push(class);
        } else if let Some(rest) = line.strip_prefix("CPE ") {
            let Some(class) = fp.classes.last_mut() else {
                return Err(RecordError::Fatal(OsDbError::CpeWithoutClass(lineno)));
            };
            class.cpe.push(self.pool.intern_first_word(rest));
        } else {
            let test = parse_test_line(&mut self.pool, line)
                .ok_or_else(|| RecordError::Syntax(line.to_string()))?;
            if !is_points {
                // Reference values are expressions; an unorderable range
                // must be caught here, not at match time.
                for av in &test.results {
                    Expr::parse(&av.value).map_err(RecordError::Fatal)?;
                }
            }
            fp.tests.push(test);
        }
        Ok(())
    }
}

/// Parse the full database text into reference entries plus the mandatory
/// point-budget entry.
pub(crate) fn parse_db(text: &str) -> OsDbResult<(Vec<FingerPrint>, FingerPrint)> {
    let mut parser = DbParser::new(text);
    parser.run()?;
    let match_points = parser.match_points.ok_or(OsDbError::MissingMatchPoints)?;
    Ok((parser.prints, match_points))
}

/// Parse a single fingerprint from text, e.g. one produced by
/// [`fp2ascii`](crate::output::fp2ascii) or pasted from a scan log.
/// Unlike the database parser this is strict: any unrecognized or blank
/// line is an error. The result is not canonicalized; callers that intend
/// to match it should [`sort`](FingerPrint::sort) it first.
pub fn parse_single_fingerprint(text: &str) -> OsDbResult<FingerPrint> {
    let mut pool = StringPool::new();
    let mut fp = FingerPrint::new();

    for (idx, raw) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();

        let parse_err = || OsDbError::FingerprintParse {
            line: lineno,
            text: raw.to_string(),
        };

        if line.is_empty() {
            return Err(parse_err());
        }

        if let Some(rest) = line.strip_prefix("Fingerprint ") {
            // Ignore a second Fingerprint line if it appears.
            if fp.name.is_none() {
                fp.name = Some(pool.intern_trimmed(rest));
            }
        } else if let Some(rest) = line.strip_prefix("MatchPoints") {
            if !rest.trim().is_empty() {
                return Err(parse_err());
            }
        } else if let Some(rest) = line.strip_prefix("Class ") {
            let class = parse_class(&mut pool, rest).ok_or_else(parse_err)?;
            fp.classes.push(class);
        } else if let Some(rest) = line.strip_prefix("CPE ") {
            let Some(class) = fp.classes.last_mut() else {
                return Err(OsDbError::CpeWithoutClass(lineno));
            };
            class.cpe.push(pool.intern_first_word(rest));
        } else if line.contains('(') {
            let test = parse_test_line(&mut pool, line).ok_or_else(parse_err)?;
            fp.tests.push(test);
        } else {
            return Err(parse_err());
        }
    }

    Ok(fp)
}
