use camtelemetry::{process_videos, CancellationToken, ExtractorConfig};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = ExtractorConfig::default();
    let mut paths = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-external" => config.use_external_tools = false,
            "--workers" => match args.next().and_then(|n| n.parse().ok()) {
                Some(n) => config = config.with_worker_count(n),
                None => return usage(),
            },
            "--resource-dir" => match args.next() {
                Some(dir) => config.resource_dir = Some(PathBuf::from(dir)),
                None => return usage(),
            },
            "-h" | "--help" => return usage(),
            _ => paths.push(PathBuf::from(arg)),
        }
    }
    if paths.is_empty() {
        return usage();
    }

    let reports = process_videos(paths, &config, &CancellationToken::new());
    let failed = reports
        .iter()
        .filter(|r| matches!(&r.telemetry, Err(e) if !e.is_no_metadata()))
        .count();

    match serde_json::to_string_pretty(&reports) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to render report: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn usage() -> ExitCode {
    eprintln!("Usage: telemetry_scan [--no-external] [--workers N] [--resource-dir DIR] <video>...");
    eprintln!("Example: telemetry_scan GX010042.MP4 GX020042.MP4");
    ExitCode::from(2)
}
