//! xcarchiver - Xcode archive-and-export build step binary.
//!
//! This binary drives an `xcodebuild archive` + `xcodebuild -exportArchive`
//! pipeline and publishes the resulting artifacts (archive, distributable
//! package, logs) to an output directory, even when the build fails.

use std::process;

use env_logger::Env;

#[tokio::main]
async fn main() {
    // Initialize logging; build steps default to info-level progress output
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match xcarchiver::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
