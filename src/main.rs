use std::io;
use std::path::Path;
use std::process::ExitCode;

use razor_markup::analyzer::{audit, OrphanOptions};
use razor_markup::config::RazorConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        // `razor-markup audit <dir>`: 監査レポートを表示して終了
        [command, dir] if command == "audit" => run_audit(Path::new(dir)),
        [] => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            match razor_markup::server::run(stdin.lock(), stdout.lock()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Server loop failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            eprintln!("usage: razor-markup [audit <dir>]");
            ExitCode::from(2)
        }
    }
}

fn run_audit(dir: &Path) -> ExitCode {
    let config = RazorConfig::load_from_dir(dir);
    match audit(dir, &OrphanOptions::from_config(&config)) {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
