//! Integration tests for the deimos matching engine

use deimos::{
    db::{parse_single_fingerprint, FingerPrintDb},
    matcher::{match_fingerprint, MatchStatus},
    output::fp2ascii,
};

const TEST_DB: &str = "\
# Deimos test database
MatchPoints
SEQ(SP=25%GCD=75%ISR=25%TI=100)
ECN(R=100%DF=20)
T1(R=100%DF=20%S=20)
U1(DF=20%RIPL=100)
IE(R=100%DFI=40)

Fingerprint Linux 2.6.23
Class Linux | Linux | 2.6.X | general purpose
CPE cpe:/o:linux:linux_kernel:2.6.23 auto
SEQ(SP=C0-D0%GCD=1-6%ISR=C7-D1%TI=Z)
T1(R=Y%DF=Y%S=O)
U1(DF=N%RIPL=G)
IE(R=Y%DFI=N)

Fingerprint Linux 2.6.30
Class Linux | Linux | 2.6.X | general purpose
SEQ(SP=C0-D5%GCD=1-6%ISR=C7-D5%TI=Z)
T1(R=Y%DF=Y%S=O)
U1(DF=N%RIPL=G)
IE(R=Y%DFI=N)

Fingerprint Microsoft Windows XP SP2
Class Microsoft | Windows | XP | general purpose
CPE cpe:/o:microsoft:windows_xp::sp2
SEQ(SP=0-A%GCD=1%TI=I)
T1(R=Y%DF=N%S=O)
U1(DF=N%RIPL=G)
IE(R=N)
";

const LINUX_OBSERVED: &str = "\
SEQ(SP=C9%GCD=1%ISR=CC%TI=Z)
T1(R=Y%DF=Y%S=O)
U1(DF=N%RIPL=G)
IE(R=Y%DFI=N)";

fn observed() -> deimos::FingerPrint {
    parse_single_fingerprint(LINUX_OBSERVED).unwrap()
}

#[test]
fn test_ranked_match_against_database() {
    let db = FingerPrintDb::parse(TEST_DB).unwrap();
    assert_eq!(db.len(), 3);

    let results = match_fingerprint(&observed(), &db, 0.85).unwrap();
    assert_eq!(results.status, MatchStatus::Success);
    assert_eq!(results.num_perfect_matches, 2);
    assert_eq!(results.len(), 2);

    let names: Vec<&str> = results.matches().iter().map(|m| &*m.name).collect();
    assert_eq!(names, vec!["Linux 2.6.23", "Linux 2.6.30"]);
    assert!(results.matches().iter().all(|m| m.accuracy == 1.0));
}

#[test]
fn test_lower_threshold_admits_partial_matches() {
    let db = FingerPrintDb::parse(TEST_DB).unwrap();
    let results = match_fingerprint(&observed(), &db, 0.5).unwrap();

    assert_eq!(results.len(), 3);
    let windows = &results.matches()[2];
    assert_eq!(&*windows.name, "Microsoft Windows XP SP2");
    // Shared weighted subtests: 560 total, 315 matched.
    assert!((windows.accuracy - 315.0 / 560.0).abs() < 1e-9);
}

#[test]
fn test_match_indices_resolve_into_database() {
    let db = FingerPrintDb::parse(TEST_DB).unwrap();
    let results = match_fingerprint(&observed(), &db, 0.85).unwrap();

    for m in results.matches() {
        let entry = db.get(m.index).unwrap();
        assert_eq!(entry.display_name(), &*m.name);
    }
    // Ties keep database order, so indices are in file order here.
    assert_eq!(results.matches()[0].index, 0);
    assert_eq!(results.matches()[1].index, 1);
}

#[test]
fn test_empty_observed_fingerprint_matches_nothing() {
    let db = FingerPrintDb::parse(TEST_DB).unwrap();
    let empty = deimos::FingerPrint::new();
    let results = match_fingerprint(&empty, &db, 0.85).unwrap();
    assert_eq!(results.status, MatchStatus::NoMatches);
    assert!(results.is_empty());
}

#[test]
fn test_unsorted_observed_input_is_canonicalized() {
    let db = FingerPrintDb::parse(TEST_DB).unwrap();
    // Same content as LINUX_OBSERVED, tests and attributes shuffled.
    let shuffled = parse_single_fingerprint(
        "IE(DFI=N%R=Y)\nU1(RIPL=G%DF=N)\nT1(S=O%R=Y%DF=Y)\nSEQ(TI=Z%SP=C9%ISR=CC%GCD=1)",
    )
    .unwrap();
    let results = match_fingerprint(&shuffled, &db, 0.85).unwrap();
    assert_eq!(results.num_perfect_matches, 2);
}

#[test]
fn test_same_name_entries_keep_best_accuracy() {
    let db_text = "\
MatchPoints
T1(R=10%DF=10)

Fingerprint Linux 2.6.X
T1(R=Y%DF=N)

Fingerprint Linux 2.6.X
T1(R=Y%DF=Y)
";
    let db = FingerPrintDb::parse(db_text).unwrap();
    let observed = parse_single_fingerprint("T1(R=Y%DF=Y)").unwrap();
    let results = match_fingerprint(&observed, &db, 0.1).unwrap();

    // Both entries share the display name; only the perfect one survives.
    assert_eq!(results.len(), 1);
    assert_eq!(results.best().unwrap().index, 1);
    assert_eq!(results.best().unwrap().accuracy, 1.0);
}

#[test]
fn test_ascii_roundtrip_through_public_api() {
    let db = FingerPrintDb::parse(TEST_DB).unwrap();
    let mut original = observed();
    original.sort();

    let text = fp2ascii(&original);
    let mut reparsed = parse_single_fingerprint(&text).unwrap();
    reparsed.sort();
    assert_eq!(original.tests, reparsed.tests);

    // The reparsed fingerprint scores identically.
    let a = match_fingerprint(&original, &db, 0.85).unwrap();
    let b = match_fingerprint(&reparsed, &db, 0.85).unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.matches().iter().zip(b.matches()) {
        assert_eq!(x.index, y.index);
        assert_eq!(x.accuracy, y.accuracy);
    }
}

#[test]
fn test_database_loaded_from_file() {
    let path = std::env::temp_dir().join("deimos-integration-test-db");
    std::fs::write(&path, TEST_DB).unwrap();

    let db = FingerPrintDb::open(&path).unwrap();
    assert_eq!(db.len(), 3);
    assert_eq!(db.prints[0].display_name(), "Linux 2.6.23");
    assert_eq!(db.prints[0].line, 9);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_shared_database_across_threads() {
    let db = std::sync::Arc::new(FingerPrintDb::parse(TEST_DB).unwrap());
    let mut handles = Vec::new();
    for _ in 0..4 {
        let db = std::sync::Arc::clone(&db);
        handles.push(std::thread::spawn(move || {
            let results = match_fingerprint(&observed(), &db, 0.85).unwrap();
            results.num_perfect_matches
        }));
    }
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}
