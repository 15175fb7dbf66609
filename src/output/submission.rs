//! Canonical text serialization of fingerprints for submission
//!
//! A submission is a synthetic `SCAN(...)` header followed by one
//! canonical test per line, or the same stream wrapped at a fixed column
//! with every line prefixed `OS:`. Several observations of the same host
//! are merged into one submission with duplicate tests elided.

use chrono::{Datelike, Local};

use crate::config::{DistanceMethod, ScanInfo, FP_WRAP_COLUMN, MAX_MERGE_FPS};
use crate::error::{OsDbError, OsDbResult};
use crate::fingerprint::{FingerPrint, FingerTest};

/// The order in which test lines appear in display output.
const TEST_ORDER: [&str; 13] = [
    "SEQ", "OPS", "WIN", "ECN", "T1", "T2", "T3", "T4", "T5", "T6", "T7", "U1", "IE",
];

fn display_rank(name: &str) -> OsDbResult<usize> {
    TEST_ORDER
        .iter()
        .position(|t| *t == name)
        .ok_or_else(|| OsDbError::UnknownTest(name.to_string()))
}

/// Textual representation of one test: `NAME(attr=val%attr=val...)`.
pub fn test2str(test: &FingerTest) -> String {
    let mut s = String::with_capacity(test.name.len() + 2 + test.results.len() * 8);
    s.push_str(&test.name);
    s.push('(');
    for (i, av) in test.results.iter().enumerate() {
        if i > 0 {
            s.push('%');
        }
        s.push_str(&av.attribute);
        s.push('=');
        s.push_str(&av.value);
    }
    s.push(')');
    s
}

/// Plain-text form of a fingerprint: one test per line, in the
/// fingerprint's current test order.
pub fn fp2ascii(fp: &FingerPrint) -> String {
    let mut s = String::new();
    for test in &fp.tests {
        s.push_str(&test2str(test));
        s.push('\n');
    }
    s
}

/// The informational `SCAN(...)` pseudo-test carrying scan conditions,
/// written at the top of every submission.
pub fn scan_line(info: &ScanInfo) -> String {
    let when = info.timestamp.unwrap_or_else(Local::now);
    let port = |p: Option<u16>| p.map(|p| p.to_string()).unwrap_or_default();

    let mut s = format!(
        "SCAN(V={}%E={}%D={}/{}%OT={}%CT={}%CU={}%PV={}",
        info.version,
        info.engine_id,
        when.month(),
        when.day(),
        port(info.open_tcp_port),
        port(info.closed_tcp_port),
        port(info.closed_udp_port),
        if info.is_private_addr() { 'Y' } else { 'N' },
    );
    if let Some(distance) = info.distance {
        s.push_str(&format!("%DS={}", distance));
    }
    if info.distance_method != DistanceMethod::None {
        s.push_str(&format!("%DC={}", info.distance_method.letter()));
    }
    s.push_str(&format!("%G={}", if info.good_fp { 'Y' } else { 'N' }));
    if let Some(oui) = info.mac_prefix {
        s.push_str(&format!("%M={:02X}{:02X}{:02X}", oui[0], oui[1], oui[2]));
    }
    s.push_str(&format!("%TM={:X}%P={})", when.timestamp(), info.platform));
    s
}

/// Two tests are literal duplicates when their attribute-name sequences
/// are identical. Values are deliberately not compared: observations of
/// one host are expected to agree, and this keeps submissions compact.
fn test_match_literal(a: &FingerTest, b: &FingerTest) -> bool {
    a.results.len() == b.results.len()
        && a.results
            .iter()
            .zip(&b.results)
            .all(|(x, y)| x.attribute == y.attribute)
}

fn wrap_submission(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4 * (s.len() / FP_WRAP_COLUMN + 1));
    let mut col = 0;
    for ch in s.chars() {
        if col == 0 {
            out.push_str("OS:");
        }
        out.push(ch);
        col += 1;
        if col == FP_WRAP_COLUMN {
            out.push('\n');
            col = 0;
        }
    }
    if col != 0 {
        out.push('\n');
    }
    out
}

/// Merge the tests of several fingerprints of the same target into one
/// submission string. Tests identical between fingerprints are included
/// once. With `wrap`, the result is wrapped for submission.
///
/// Zero inputs yield `"(None)"` and more than 32 yield `"(Too many)"`.
pub fn merge_fingerprints(
    prints: &[&FingerPrint],
    info: &ScanInfo,
    wrap: bool,
) -> OsDbResult<String> {
    if prints.is_empty() {
        return Ok("(None)".to_string());
    }
    if prints.len() > MAX_MERGE_FPS {
        return Ok("(Too many)".to_string());
    }

    // Flatten every test into one list keyed by display order; the sort
    // is stable, so equal names keep their scan order and end up
    // contiguous.
    let mut tests: Vec<(usize, &FingerTest)> = Vec::new();
    for fp in prints {
        for test in &fp.tests {
            tests.push((display_rank(&test.name)?, test));
        }
    }
    tests.sort_by_key(|(rank, _)| *rank);

    let mut merged: Vec<(usize, &FingerTest)> = Vec::new();
    for (rank, test) in tests {
        let duplicate = merged
            .iter()
            .any(|(r, kept)| *r == rank && test_match_literal(kept, test));
        if !duplicate {
            merged.push((rank, test));
        }
    }

    // Safety check: every input test must have a counterpart in the
    // merged list.
    for fp in prints {
        for test in &fp.tests {
            let present = merged
                .iter()
                .any(|(_, kept)| kept.name == test.name && test_match_literal(kept, test));
            if !present {
                return Err(OsDbError::TestLost(test2str(test)));
            }
        }
    }

    let mut out = scan_line(info);
    if !wrap {
        out.push('\n');
    }
    for (_, test) in &merged {
        out.push_str(&test2str(test));
        if !wrap {
            out.push('\n');
        }
    }

    Ok(if wrap { wrap_submission(&out) } else { out })
}
