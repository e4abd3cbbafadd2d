use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use clap::error::ErrorKind;

/// Renders PNG charts from the graph-algorithm benchmark reports.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON output of the timing benchmark
    time_report: PathBuf,
    /// Free-text output of the peak-memory benchmark
    mem_report: PathBuf,
    /// Directory the PNG files are written into
    out_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }
        Err(_) => {
            eprintln!("Usage: benchplot TIME_REPORT.json MEM_REPORT.txt OUT_DIR");
            process::exit(1);
        }
    };

    let time_data = report::parse_time_report(&cli.time_report)?;
    let mem_data = report::parse_mem_report(&cli.mem_report)?;

    for (algo, series) in &time_data {
        eprintln!("Plotting {algo} time");
        charts::plot_time(algo, series, &cli.out_dir)?;
    }

    for (algo, series) in &mem_data {
        eprintln!("Plotting {algo} mem");
        charts::plot_mem(algo, series, &cli.out_dir)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_three_paths() {
        assert!(Cli::try_parse_from(["benchplot"]).is_err());
        assert!(Cli::try_parse_from(["benchplot", "a.json"]).is_err());
        assert!(Cli::try_parse_from(["benchplot", "a.json", "b.txt"]).is_err());
        assert!(Cli::try_parse_from(["benchplot", "a.json", "b.txt", "out", "extra"]).is_err());
    }

    #[test]
    fn test_cli_accepts_exactly_three_paths() {
        let cli = Cli::try_parse_from(["benchplot", "a.json", "b.txt", "out"]).unwrap();
        assert_eq!(cli.time_report, PathBuf::from("a.json"));
        assert_eq!(cli.mem_report, PathBuf::from("b.txt"));
        assert_eq!(cli.out_dir, PathBuf::from("out"));
    }
}
