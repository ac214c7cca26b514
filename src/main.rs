use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::fs;
use std::path::PathBuf;

use object_cutter::{
    find_annotation_file, parse_annotation_file, parse_classes, process_dataset, Args, ClassFilter,
};
use object_cutter::utils::create_output_directory;

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let source_dir = fs::canonicalize(&args.source_directory).with_context(|| {
        format!(
            "The specified source directory does not exist: {}",
            args.source_directory.display()
        )
    })?;

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
    {
        warn!("Failed to configure the worker pool: {}", e);
    }

    let classes = parse_classes(args.classes.as_deref())?;
    let filter = ClassFilter::from_classes(&classes);

    let output_root = create_output_directory(
        &args
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from("ObjectCutter_output")),
    )?;

    info!("Starting the conversion process...");

    let annotation_file = find_annotation_file(&source_dir)?;
    info!("Using annotation file {}", annotation_file.display());

    let doc = parse_annotation_file(&annotation_file)?;
    process_dataset(&doc, &source_dir.join("images"), &output_root, &filter)?;

    info!("Conversion process completed successfully.");
    Ok(())
}
