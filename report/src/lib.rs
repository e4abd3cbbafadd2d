use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportErrors {
    #[error("failed to read report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse timing report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("benchmark name {0:?} does not match IDENT<NUM, NUM>")]
    BenchNameFormat(String),
    #[error("benchmark {name:?} has no {counter:?} counter")]
    MissingCounter { name: String, counter: &'static str },
}

/// One (algorithm, density) group of samples as three index-aligned columns,
/// in file append order. `n` is the combined size counter (V + E, or V * E
/// for LEX M), `v` the vertex count, `values` the measured quantity.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Series {
    pub n: Vec<f64>,
    pub v: Vec<f64>,
    pub values: Vec<f64>,
}

impl Series {
    fn push(&mut self, n: f64, v: f64, value: f64) {
        self.n.push(n);
        self.v.push(v);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Display name -> density percentage -> series.
pub type ReportData = BTreeMap<String, BTreeMap<u32, Series>>;

/// Maps the raw benchmark identifiers to their display labels. Names outside
/// the table pass through unchanged.
pub fn display_name(raw: &str) -> &str {
    match raw {
        "fill_random_graph" | "fill_in_random_graph" => "FILL",
        "lex_m_random_graph" => "LEX M",
        "lex_p_random_graph" => "LEX P",
        other => other,
    }
}

static BENCH_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\w]+)<(\d+), (\d+)>").expect("hardcoded regex"));

static MEM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    // the memory bench prints `<NUM,NUM>` without a space after the comma
    Regex::new(r"([\w]+)<(\d+), ?(\d+)> v=(\d+) n=(\d+): max (\d+) bytes").expect("hardcoded regex")
});

#[derive(Debug, Deserialize)]
struct TimeReport {
    benchmarks: Vec<BenchEntry>,
}

#[derive(Debug, Deserialize)]
struct BenchEntry {
    name: String,
    n: Option<f64>,
    v: Option<f64>,
    cpu_time: Option<f64>,
}

impl BenchEntry {
    fn counter(&self, value: Option<f64>, counter: &'static str) -> Result<f64, ReportErrors> {
        value.ok_or_else(|| ReportErrors::MissingCounter {
            name: self.name.clone(),
            counter,
        })
    }
}

pub fn parse_time_report(path: impl AsRef<Path>) -> Result<ReportData, ReportErrors> {
    parse_time_str(&fs::read_to_string(path)?)
}

/// Parses the JSON timing report. Rows whose name ends in `BigO` or `RMS` are
/// complexity summaries produced by the benchmark library, not samples, and
/// are skipped before any field is touched.
pub fn parse_time_str(json: &str) -> Result<ReportData, ReportErrors> {
    let report: TimeReport = serde_json::from_str(json)?;

    let mut data = ReportData::new();
    for bench in &report.benchmarks {
        if bench.name.ends_with("BigO") || bench.name.ends_with("RMS") {
            continue;
        }

        let (func, perc) = split_bench_name(&bench.name)?;
        let n = bench.counter(bench.n, "n")?;
        let v = bench.counter(bench.v, "v")?;
        let cpu_time = bench.counter(bench.cpu_time, "cpu_time")?;

        data.entry(func)
            .or_default()
            .entry(perc)
            .or_default()
            .push(n, v, cpu_time);
    }

    Ok(data)
}

pub fn parse_mem_report(path: impl AsRef<Path>) -> Result<ReportData, ReportErrors> {
    parse_mem_str(&fs::read_to_string(path)?)
}

/// Parses the free-text memory report. Lines that do not match the expected
/// shape are silently ignored.
pub fn parse_mem_str(text: &str) -> Result<ReportData, ReportErrors> {
    let mut data = ReportData::new();
    for caps in MEM_LINE.captures_iter(text) {
        let func = display_name(&caps[1]).to_owned();
        let num = parse_number(&caps[0], &caps[2])?;
        let div = parse_number(&caps[0], &caps[3])?;
        let v = parse_number(&caps[0], &caps[4])?;
        let n = parse_number(&caps[0], &caps[5])?;
        let max_mem = parse_number(&caps[0], &caps[6])?;

        data.entry(func)
            .or_default()
            .entry(density(num, div))
            .or_default()
            .push(n as f64, v as f64, max_mem as f64);
    }

    Ok(data)
}

/// Extracts the display name and density percentage from a benchmark label
/// shaped like `identifier<numerator, denominator>`. A label without that
/// shape is a hard error and aborts the whole run.
fn split_bench_name(name: &str) -> Result<(String, u32), ReportErrors> {
    let caps = BENCH_NAME
        .captures(name)
        .ok_or_else(|| ReportErrors::BenchNameFormat(name.to_owned()))?;
    let num = parse_number(name, &caps[2])?;
    let div = parse_number(name, &caps[3])?;
    Ok((display_name(&caps[1]).to_owned(), density(num, div)))
}

/// Floor of 100 * num / div. The result doubles as the grouping key and the
/// hue index, so the floor semantics must hold exactly.
fn density(num: u64, div: u64) -> u32 {
    (100 * num / div) as u32
}

fn parse_number(context: &str, digits: &str) -> Result<u64, ReportErrors> {
    digits
        .parse()
        .map_err(|_| ReportErrors::BenchNameFormat(context.to_owned()))
}
