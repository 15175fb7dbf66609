use clap::{Arg, ArgAction, Command};
use colored::*;
use std::process;

use deimos::{
    config::DEFAULT_ACCURACY_THRESHOLD,
    db::{parse_single_fingerprint, FingerPrintDb},
    matcher::{compare_fingerprints, match_fingerprint},
    output::{build_report, render_report, OutputFormat},
};

fn print_banner() {
    println!("{}", "Deimos - OS fingerprint matching engine".truecolor(231, 76, 60).bold());
    println!("{}", "\"Every stack betrays its maker.\"".bright_blue());
    println!();
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = Command::new("deimos")
        .version(env!("CARGO_PKG_VERSION"))
        .author("ibrahimsql")
        .about("Deimos: ranks known OS signatures against an observed network fingerprint")
        .arg(
            Arg::new("fingerprint")
                .value_name("FINGERPRINT-FILE")
                .help("File containing the observed fingerprint (one test per line)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("os-db")
                .short('D')
                .long("os-db")
                .value_name("FILE")
                .help("Reference OS fingerprint database")
                .default_value("nmap-os-db"),
        )
        .arg(
            Arg::new("threshold")
                .short('t')
                .long("threshold")
                .value_name("ACCURACY")
                .help("Minimum accuracy for a candidate to be listed (0..1)")
                .value_parser(clap::value_parser!(f64))
                .default_value("0.85"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format: text or json")
                .default_value("text"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log per-attribute diagnostics for the best match (requires RUST_LOG=debug)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-banner")
                .long("no-banner")
                .help("Hide the banner")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let format: OutputFormat = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text")
        .parse()
        .unwrap_or_else(|e| {
            eprintln!("{} {}", "[!] ERROR:".bright_red(), e);
            process::exit(2);
        });

    if format == OutputFormat::Text && !matches.get_flag("no-banner") {
        print_banner();
    }

    let threshold = *matches
        .get_one::<f64>("threshold")
        .unwrap_or(&DEFAULT_ACCURACY_THRESHOLD);
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("threshold must be between 0 and 1");
    }

    let db_path = matches.get_one::<String>("os-db").expect("has default");
    let db = FingerPrintDb::open(db_path)
        .map_err(|e| anyhow::anyhow!("cannot load OS database {}: {}", db_path, e))?;

    let fp_path = matches.get_one::<String>("fingerprint").expect("required");
    let text = std::fs::read_to_string(fp_path)
        .map_err(|e| anyhow::anyhow!("cannot read fingerprint {}: {}", fp_path, e))?;
    let mut observed = parse_single_fingerprint(&text)?;
    observed.sort();

    let results = match_fingerprint(&observed, &db, threshold)?;

    if matches.get_flag("verbose") {
        // Rerun the best match with diagnostics enabled so mismatching
        // attributes show up in the debug log.
        if let Some(best) = results.best() {
            if let Some(reference) = db.get(best.index) {
                compare_fingerprints(reference, &observed, &db.match_points, true)?;
            }
        }
    }

    let report = build_report(&results, &db);
    print!("{}", render_report(&report, format)?);

    Ok(())
}
