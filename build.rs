// Deimos build script

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Target platform, emitted in the P= field of submission headers
    let target = env::var("TARGET").unwrap();
    println!("cargo:rustc-env=DEIMOS_TARGET={}", target);
}
