//! # vatscope - Main Entry Point
//!
//! Loads a vat trace capture, reconstructs the thread model, prints a
//! summary, and optionally exports Chrome trace JSON for Perfetto.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::BufWriter;

use vatscope::cli::Args;
use vatscope::domain::TraceError;
use vatscope::export::ChromeTraceExporter;
use vatscope::simplify::simplify_binds;
use vatscope::vat::Vat;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_BADTRACE: i32 = 65;
const EXIT_IOERR: i32 = 66;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<TraceError>() {
        Some(TraceError::Format(_) | TraceError::Model(_)) => EXIT_BADTRACE,
        Some(TraceError::Io(_)) => EXIT_IOERR,
        None => EXIT_ERROR,
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut vat = vatscope::load_trace_file(&args.trace)
        .with_context(|| format!("Failed to load trace {}", args.trace.display()))?;
    info!("loaded {}", args.trace.display());

    if args.simplify {
        simplify_binds(&mut vat);
    }

    if !args.quiet {
        print_summary(&vat);
    }

    if let Some(ref path) = args.export {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let exporter = ChromeTraceExporter::new(&vat);
        exporter.export(BufWriter::new(file))?;
        if !args.quiet {
            println!("exported {} events to {}", exporter.event_count(), path.display());
        }
    }

    Ok(())
}

fn print_summary(vat: &Vat) {
    println!("duration: {:.6}s", vat.duration());
    println!("threads:  {} ({} top-level)", vat.thread_count(), vat.top().children().len());

    let resolved = vat.threads().filter(|t| t.resolved()).count();
    let failed = vat.threads().filter(|t| t.failure().is_some()).count();
    println!("resolved: {resolved} ({failed} failed)");

    let gc_total: f64 = vat.gc_periods().iter().map(|&(start, end)| end - start).sum();
    println!("gc:       {} pauses, {:.6}s total", vat.gc_periods().len(), gc_total);

    for counter in vat.counters() {
        println!(
            "counter:  {} ({} samples, min {}, max {})",
            counter.name(),
            counter.samples().len(),
            counter.min(),
            counter.max()
        );
    }
}
