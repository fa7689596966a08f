//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "vatscope",
    about = "Reconstruct the thread model of a vat trace capture",
    after_help = "\
EXAMPLES:
    vatscope capture.vtr                     Load a capture and print a summary
    vatscope capture.vtr --simplify          Collapse wakeup-only bind threads
    vatscope capture.vtr --export out.json   Export Chrome trace JSON for Perfetto"
)]
pub struct Args {
    /// Trace capture file to load
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Export the reconstructed model as Chrome trace JSON
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Collapse synchronization threads that exist purely to model a wakeup
    #[arg(long)]
    pub simplify: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
