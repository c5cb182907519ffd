use std::{env, path::Path, process};

use anyhow::Context;
use quake2ogre::{
    convert::{ConvertOptions, convert_file, load_model, summarize_model},
    project::{ProjectSettings, load_project_settings, save_project_settings},
};

const USAGE: &str = "Usage:
  quake2ogre <model.json> <output-prefix> [settings.json]
  quake2ogre --project <settings.json>
  quake2ogre --init <settings.json>
  quake2ogre --info <model.json>";

fn main() {
    // info+ unless RUST_LOG overrides
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.as_slice() {
        [_, flag, input] if flag == "--info" => print_info(Path::new(input)),
        [_, flag, settings] if flag == "--init" => init_settings(Path::new(settings)),
        [_, flag, settings] if flag == "--project" => convert_project(Path::new(settings)),
        [_, input, output] => convert(input, output, None),
        [_, input, output, settings] => convert(input, output, Some(settings)),
        _ => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    }
}

fn print_info(input: &Path) -> anyhow::Result<()> {
    let model = load_model(input)?;
    let summary = summarize_model(&model);
    let json =
        serde_json::to_string_pretty(&summary).context("failed to serialize model summary")?;
    println!("{json}");
    Ok(())
}

fn init_settings(path: &Path) -> anyhow::Result<()> {
    save_project_settings(path, &ProjectSettings::default())?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}

fn convert_project(path: &Path) -> anyhow::Result<()> {
    let settings = load_project_settings(path)?;
    let (input, output) = settings.resolve_paths()?;
    run_conversion(&input, &output, &settings.options)
}

fn convert(input: &str, output: &str, settings: Option<&String>) -> anyhow::Result<()> {
    let options = match settings {
        Some(path) => load_project_settings(Path::new(path))?.options,
        None => ConvertOptions::default(),
    };
    run_conversion(Path::new(input), Path::new(output), &options)
}

fn run_conversion(input: &Path, output: &Path, options: &ConvertOptions) -> anyhow::Result<()> {
    let report = convert_file(input, output, options)?;

    println!("Bones: {}", report.bone_count);
    println!(
        "Submeshes: {}, Vertices: {}, Triangles: {}",
        report.submesh_count, report.total_vertices, report.total_triangles
    );
    println!(
        "Animations: {} exported, {} skipped",
        report.exported_animations.len(),
        report.skipped_animations.len()
    );
    if let Some(origin) = &report.rerooted_to {
        println!("Re-rooted to: {origin}");
    }
    for issue in &report.issues {
        println!("[{:?}] {}: {}", issue.severity, issue.code, issue.message);
    }

    Ok(())
}
