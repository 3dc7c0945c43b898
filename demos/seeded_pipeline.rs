//! Seeded, offline run of the whole pipeline.
//!
//! Writes a tiny label file into a temporary directory, points the locator at
//! it, and runs twice with the same seed to show the result is reproducible.
//!
//! Run with:
//!   cargo run --example seeded_pipeline

use biasgrid::pipeline;
use biasgrid::{npy_v1_bytes, DatasetLocator, PipelineConfig, TerminalRenderer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("biasgrid-demo");
    std::fs::create_dir_all(&dir)?;

    // 30 normal, 10 abnormal labels as a `|u1` vector.
    let labels: Vec<u8> = (0..40).map(|i| u8::from(i % 4 == 3)).collect();
    let bytes = npy_v1_bytes("|u1", &format!("({},)", labels.len()), &labels);
    std::fs::write(dir.join("y_head_train.npy"), bytes)?;

    let cfg = PipelineConfig::default()
        .with_locator(DatasetLocator::local(&dir))
        .with_grid_size(20)
        .with_seed(42);

    let first = pipeline::run(&cfg)?;
    let second = pipeline::run(&cfg)?;
    println!("source: {:?}", first.source);
    println!("estimate: {}", first.estimate);
    println!("theta: {:.4} rad", first.angle.radians());
    println!("counts: {:?}", first.counts.to_bit_map());
    println!("reproducible: {}", first.grid == second.grid);
    println!();

    TerminalRenderer::for_stdout().render(&first.grid, &first.counts, &mut std::io::stdout())?;
    Ok(())
}
