use anyhow::{bail, Result};
use binid_core::{Confidence, Format, IdentificationResult, Probe, DEFAULT_PROBE_BYTES};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Executable format and architecture identification
#[derive(Parser)]
#[command(
    name = "binid",
    about = "Identify PE, ELF and Mach-O executables and their target architecture",
    version,
    author
)]
struct Cli {
    /// Paths to binary files
    #[arg(required = true)]
    paths: Vec<std::path::PathBuf>,

    /// Print results as a JSON array
    #[arg(long)]
    json: bool,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// Number of leading bytes to read from each file
    #[arg(long, default_value_t = DEFAULT_PROBE_BYTES as u64, value_parser = clap::value_parser!(u64).range(64..))]
    probe_bytes: u64,
}

#[derive(Serialize, Tabled)]
struct Report {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Architecture")]
    architecture: String,
    #[tabled(rename = "Bits")]
    bits: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

impl From<&Probe> for Report {
    fn from(probe: &Probe) -> Self {
        let result = &probe.result;
        Report {
            path: probe.path.clone(),
            format: result.format.to_string(),
            architecture: result.describe_architecture(),
            bits: result
                .bitness
                .map(|b| b.bits().to_string())
                .unwrap_or_else(|| "-".to_string()),
            confidence: result.confidence.to_string(),
        }
    }
}

/// Format label coloured by how much was learned: green for a detected
/// format, yellow for an assumed architecture, red for unknown input.
fn format_label(result: &IdentificationResult) -> String {
    let label = result.format.to_string();
    match result.format {
        Format::Unknown => label.red().to_string(),
        _ if result.confidence == Confidence::Assumed => label.yellow().to_string(),
        _ => label.green().to_string(),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let limit = usize::try_from(cli.probe_bytes).unwrap_or(usize::MAX);
    let mut probes = Vec::with_capacity(cli.paths.len());
    let mut failed = 0usize;
    for path in &cli.paths {
        match Probe::open_with_limit(path, limit) {
            Ok(probe) => probes.push(probe),
            Err(err) => {
                failed += 1;
                log::error!("{}: {err:#}", path.display());
            }
        }
    }

    let mut reports: Vec<Report> = probes.iter().map(Report::from).collect();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if !reports.is_empty() {
        for (report, probe) in reports.iter_mut().zip(&probes) {
            report.format = format_label(&probe.result);
        }
        let mut table = Table::new(&reports);
        table.with(Style::modern());
        println!("{table}");

        let unknown = probes.iter().filter(|p| !p.result.is_known()).count();
        let identified = probes.len() - unknown;
        let summary = format!("{identified} identified, {unknown} unknown");
        if unknown == 0 {
            println!("{}", summary.green());
        } else {
            println!("{}", summary.yellow());
        }
    }

    if failed > 0 {
        bail!("{failed} of {} paths could not be read", cli.paths.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use binid_core::{identify, Architecture};

    #[test]
    fn format_labels_are_coloured_by_outcome() {
        colored::control::set_override(true);

        let known = identify(b"\x7FELF\x02\x01\x01\0\0\0\0\0\0\0\0\0\x02\0\x3E\0");
        assert_eq!(known.architecture, Architecture::X86_64);
        assert_eq!(format_label(&known), "Linux Executable".green().to_string());

        let unknown = IdentificationResult::unknown();
        assert_eq!(format_label(&unknown), "Unknown".red().to_string());
        assert!(format_label(&unknown).contains("\x1b["));

        let dos = identify(b"MZ\0\0");
        assert_eq!(format_label(&dos), "Windows or DOS Program".yellow().to_string());

        colored::control::unset_override();
    }
}
