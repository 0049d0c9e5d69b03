//! Redfish schema converter CLI
//!
//! Converts a folder of Redfish JSON Schema files to OpenAPI YAML files
//! along with the OpenAPI Service Document.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use redfish_openapi::{
    collect_input_files, is_versioned_filename, yaml_filename, Config, Converter, Severity,
};

#[derive(Parser)]
#[command(name = "redfish-openapi")]
#[command(about = "Convert Redfish JSON Schema files to OpenAPI YAML files and a service document")]
#[command(version)]
struct Cli {
    /// The folder containing the JSON Schema files to convert
    #[arg(long, short = 'I')]
    input: PathBuf,

    /// The folder to write the converted YAML files
    #[arg(long, short = 'O')]
    output: PathBuf,

    /// The JSON file that describes configuration options for the output
    #[arg(long, short = 'C')]
    config: PathBuf,

    /// A base OpenAPI service document to extend
    #[arg(long, short = 'B')]
    base: Option<PathBuf>,

    /// Overwrite versioned files in the output directory if they already exist
    #[arg(long, short = 'W', default_value_t = true, action = clap::ArgAction::Set)]
    overwrite: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run(cli: &Cli) -> Result<(), u8> {
    let config = Config::from_file(&cli.config).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let service_file = config.output_file.clone();

    std::fs::create_dir_all(&cli.output).map_err(|e| {
        eprintln!("Error creating {}: {}", cli.output.display(), e);
        3u8
    })?;

    let mut converter = Converter::new(config, &cli.input);
    if let Some(base) = &cli.base {
        converter.load_base(base);
    }

    let files = collect_input_files(&cli.input).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    for file in &files {
        let filename = file
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        println!("Generating YAML for: {}", filename);

        let Some(converted) = converter.convert_file(file) else {
            continue;
        };

        // Versioned output that already exists is left untouched unless
        // overwriting was requested.
        let out_path = cli.output.join(yaml_filename(filename));
        if cli.overwrite || !is_versioned_filename(filename) || !out_path.exists() {
            write_yaml(&out_path, &converted)?;
        }
    }

    println!("Generating Service Document: {}", service_file);
    let conversion = converter.finish();
    write_yaml(&PathBuf::from(&service_file), &conversion.service_document)?;

    print_report(&conversion.report);
    Ok(())
}

fn write_yaml(path: &PathBuf, document: &serde_json::Value) -> Result<(), u8> {
    let text = serde_yaml::to_string(document).map_err(|e| {
        eprintln!("Error serializing {}: {}", path.display(), e);
        2u8
    })?;
    std::fs::write(path, text).map_err(|e| {
        eprintln!("Error writing {}: {}", path.display(), e);
        3u8
    })
}

fn print_report(report: &redfish_openapi::ConversionReport) {
    for diagnostic in &report.diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        let mut location = diagnostic.file.clone();
        if !diagnostic.path.is_empty() {
            if !location.is_empty() {
                location.push(' ');
            }
            location.push_str(&diagnostic.path);
        }
        if location.is_empty() {
            eprintln!("{}[{}]: {}", label, diagnostic.code, diagnostic.message);
        } else {
            eprintln!("{}[{}] {}: {}", label, diagnostic.code, location, diagnostic.message);
        }
    }

    println!(
        "{} files converted, {} skipped ({} errors, {} warnings)",
        report.files_processed,
        report.files_skipped,
        report.errors(),
        report.warnings()
    );
}
