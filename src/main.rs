mod cli;
mod decode;
mod endpoint;
mod error;
mod filters;
mod host;
mod interpreter;
mod invocation;
mod job;
mod options;
mod orchestrator;
mod projector;
mod results;
mod session;
mod supervisor;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Args;
use decode::OutputEncoding;
use host::{SystemHost, SystemVolumeCatalog};
use orchestrator::Orchestrator;
use projector::SmoothedProgress;
use session::SessionStatus;
use supervisor::WorkerSpec;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Err(e) = args.validate() {
        eprintln!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let spec = WorkerSpec {
        program: args.worker.clone(),
        encoding: OutputEncoding::Utf16Le,
    };
    let orchestrator = Orchestrator::with_parts(
        spec,
        Arc::new(SystemHost),
        Arc::new(SystemVolumeCatalog),
    );

    if args.list_volumes {
        print_volumes(&orchestrator);
        return Ok(());
    }

    let request = args.to_request();
    let handle = orchestrator.start_recovery(&request)?;
    info!(destination = %handle.destination(), "recovery started");

    let mut smoothed = SmoothedProgress::new();
    let mut printed_logs = 0usize;
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    let final_session = loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nCancelling...");
                orchestrator.cancel_recovery()?;
            }
        }

        let Some(session) = orchestrator.snapshot() else {
            continue;
        };

        for line in &session.logs[printed_logs..] {
            println!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), line);
        }
        printed_logs = session.logs.len();

        let shown = smoothed.tick(&session);
        eprint!(
            "\r[{:?}] {:.1}%  elapsed {}s ",
            session.status,
            shown,
            projector::elapsed(&session).as_secs()
        );

        if session.status.is_terminal() {
            // Let the tail of the event stream land before the summary.
            tokio::time::sleep(Duration::from_millis(200)).await;
            let session = orchestrator.snapshot().unwrap_or(session);
            for line in &session.logs[printed_logs..] {
                println!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), line);
            }
            eprintln!();
            break session;
        }
    };

    println!();
    println!("Status:          {:?}", final_session.status);
    println!(
        "Elapsed:         {}s",
        projector::elapsed(&final_session).as_secs()
    );
    println!(
        "Files recovered: {}",
        projector::recovered_file_count(&final_session.logs)
    );

    if final_session.status == SessionStatus::Completed {
        let files = orchestrator.scan_recovered_files(handle.destination())?;
        println!("Files on disk:   {}", files.len());
        for file in files.iter().take(20) {
            println!("  [{}] {} ({} bytes)", file.category, file.name, file.size);
        }
        if files.len() > 20 {
            println!("  ... and {} more", files.len() - 20);
        }
    }

    Ok(())
}

fn print_volumes(orchestrator: &Orchestrator) {
    const GB: f64 = 1_073_741_824.0;
    println!("{:<4} {:<20} {:<8} {:>10} {:>10}", "ID", "Label", "FS", "Total", "Used");
    for vol in orchestrator.list_volumes() {
        println!(
            "{:<4} {:<20} {:<8} {:>7.1} GB {:>7.1} GB{}",
            vol.id,
            vol.label,
            vol.fs,
            vol.total_bytes as f64 / GB,
            vol.used_bytes as f64 / GB,
            if vol.is_system { "  (system)" } else { "" }
        );
    }
}
