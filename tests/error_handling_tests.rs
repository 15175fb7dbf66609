//! Fatal database error paths exercised through the public API
//!
//! Per-record syntax problems are recovered by the parser; everything the
//! scoring invariants rely on must fail loudly instead of producing a
//! silently wrong accuracy.

use deimos::{
    db::{parse_single_fingerprint, FingerPrintDb},
    matcher::{match_fingerprint, MatchStatus},
    OsDbError,
};

#[test]
fn test_unreadable_database_file() {
    let err = FingerPrintDb::open("/nonexistent/deimos-os-db").unwrap_err();
    assert!(matches!(err, OsDbError::IoError(_)));
}

#[test]
fn test_duplicate_match_points_aborts_parse() {
    let db = "MatchPoints\nT1(R=10)\n\nMatchPoints\nT1(R=10)\n";
    let err = FingerPrintDb::parse(db).unwrap_err();
    assert!(matches!(err, OsDbError::DuplicateMatchPoints(_)));
}

#[test]
fn test_database_without_match_points_is_rejected() {
    let db = "Fingerprint Lonely\nT1(R=Y)\n";
    let err = FingerPrintDb::parse(db).unwrap_err();
    assert!(matches!(err, OsDbError::MissingMatchPoints));
}

#[test]
fn test_cpe_before_class_aborts_parse() {
    let db = "\
MatchPoints
T1(R=10)

Fingerprint Odd
CPE cpe:/o:vendor:product
Class V | F | G | router
";
    let err = FingerPrintDb::parse(db).unwrap_err();
    assert!(matches!(err, OsDbError::CpeWithoutClass(5)));
}

#[test]
fn test_unorderable_range_aborts_parse() {
    for expr in ["47-3B", "5-5"] {
        let db = format!("MatchPoints\nT1(W=10)\n\nFingerprint X\nT1(W={})\n", expr);
        let err = FingerPrintDb::parse(&db).unwrap_err();
        assert!(matches!(err, OsDbError::BadRange(_)), "expression {}", expr);
    }
}

#[test]
fn test_missing_point_weight_fails_matching() {
    // MatchPoints knows T1.R but not T1.DF, which both sides share.
    let db = FingerPrintDb::parse(
        "MatchPoints\nT1(R=10)\n\nFingerprint X\nT1(R=Y%DF=N)\n",
    )
    .unwrap();
    let observed = parse_single_fingerprint("T1(R=Y%DF=N)").unwrap();
    let err = match_fingerprint(&observed, &db, 0.85).unwrap_err();
    assert!(matches!(err, OsDbError::MissingPoints { .. }));
}

#[test]
fn test_missing_point_test_fails_matching() {
    let db = FingerPrintDb::parse(
        "MatchPoints\nT1(R=10)\n\nFingerprint X\nT4(R=Y)\n",
    )
    .unwrap();
    let observed = parse_single_fingerprint("T4(R=Y)").unwrap();
    let err = match_fingerprint(&observed, &db, 0.85).unwrap_err();
    assert!(matches!(err, OsDbError::MissingPointsTest(_)));
}

#[test]
fn test_negative_point_weight_fails_matching() {
    let db = FingerPrintDb::parse(
        "MatchPoints\nT1(R=-5)\n\nFingerprint X\nT1(R=Y)\n",
    )
    .unwrap();
    let observed = parse_single_fingerprint("T1(R=Y)").unwrap();
    let err = match_fingerprint(&observed, &db, 0.85).unwrap_err();
    match err {
        OsDbError::BogusPoints { value, .. } => assert_eq!(value, "-5"),
        other => panic!("expected BogusPoints, got {:?}", other),
    }
}

#[test]
fn test_unused_bogus_weight_is_not_touched() {
    // The bad weight sits on an attribute the observed fingerprint never
    // shares, so scoring never reads it.
    let db = FingerPrintDb::parse(
        "MatchPoints\nT1(R=10%W=junk)\n\nFingerprint X\nT1(R=Y%W=5)\n",
    )
    .unwrap();
    let observed = parse_single_fingerprint("T1(R=Y)").unwrap();
    let results = match_fingerprint(&observed, &db, 0.85).unwrap();
    assert_eq!(results.num_perfect_matches, 1);
}

#[test]
fn test_capacity_overflow_with_perfect_matches() {
    // 37 distinct entries that all match perfectly: one more than the
    // ranked list holds.
    let mut db_text = String::from("MatchPoints\nT1(R=10)\n\n");
    for i in 0..37 {
        db_text.push_str(&format!("Fingerprint OS variant {}\nT1(R=Y)\n\n", i));
    }
    let db = FingerPrintDb::parse(&db_text).unwrap();
    let observed = parse_single_fingerprint("T1(R=Y)").unwrap();

    let results = match_fingerprint(&observed, &db, 0.85).unwrap();
    assert_eq!(results.status, MatchStatus::TooManyPerfect);
    assert_eq!(results.num_perfect_matches, 36);
}

#[test]
fn test_single_fingerprint_error_carries_line_number() {
    let err = parse_single_fingerprint("T1(R=Y)\nnot a test line").unwrap_err();
    match err {
        OsDbError::FingerprintParse { line, .. } => assert_eq!(line, 2),
        other => panic!("expected FingerprintParse, got {:?}", other),
    }
}
