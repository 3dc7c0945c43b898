use std::process::ExitCode;

use biasgrid::pipeline;
use biasgrid::{PipelineConfig, TerminalRenderer};
use tracing::{error, Level};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = PipelineConfig::default();
    let report = match pipeline::run(&cfg) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let renderer = TerminalRenderer::for_stdout();
    if let Err(e) = renderer.render(&report.grid, &report.counts, &mut std::io::stdout().lock()) {
        eprintln!("error: failed to draw grid: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
