//! End-to-end tests from a raw extract to the analysis report.

use hobart::accruals::AccrualModelKind;
use hobart::panel::write_csv;
use hobart::{OUTPUT_COLUMNS, PipelineConfig, PipelineError, prepare_sample};
use polars::prelude::*;
use std::path::PathBuf;

/// Deterministic values in [0, 1).
struct Sequence(u64);

impl Sequence {
    fn next(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Firm-year variables drawn as a share of total assets: (name, low, high).
const SCALED: [(&str, f64, f64); 22] = [
    ("sale", 0.5, 1.5),
    ("oancf", 0.0, 0.15),
    ("ibc", -0.02, 0.10),
    ("recch", -0.01, 0.01),
    ("invch", -0.01, 0.01),
    ("apalch", -0.01, 0.02),
    ("txach", -0.005, 0.005),
    ("aoloch", -0.01, 0.01),
    ("ppegt", 0.2, 0.8),
    ("ppent", 0.1, 0.5),
    ("csho", 0.01, 0.05),
    ("prcc_f", 10.0, 40.0),
    ("ceq", 0.2, 0.6),
    ("lt", 0.3, 0.7),
    ("intan", 0.0, 0.1),
    ("gdwl", 0.0, 0.05),
    ("aqs", 0.0, 0.02),
    ("acqsc", 0.0, 0.02),
    ("cogs", 0.3, 0.9),
    ("ib", -0.02, 0.10),
    ("xint", 0.0, 0.02),
    ("dvc", 0.0, 0.03),
];

const YEARS: std::ops::RangeInclusive<i64> = 2000..=2004;

/// Raw extract: `firms` firms in each of two industries, plus one financial
/// firm and one foreign filer that the base sample drops.
fn raw_extract(firms: usize) -> DataFrame {
    let mut rng = Sequence(42);
    let mut gvkey = Vec::new();
    let mut fyear = Vec::new();
    let mut indfmt = Vec::new();
    let mut fic = Vec::new();
    let mut sic = Vec::new();
    let mut sich = Vec::new();
    let mut conm = Vec::new();
    let mut at = Vec::new();
    let mut scaled: Vec<Vec<f64>> = vec![Vec::new(); SCALED.len()];

    let mut add_firm = |id: i64, header_sic: i64, country: &str, rng: &mut Sequence| {
        let mut assets = 100.0 + 900.0 * rng.next();
        for year in YEARS {
            gvkey.push(id);
            fyear.push(year);
            indfmt.push("INDL");
            fic.push(country.to_string());
            sic.push(header_sic);
            sich.push(if year == 2000 { None } else { Some(header_sic) });
            conm.push(format!("FIRM {id}"));
            at.push(assets);
            for (values, (_, low, high)) in scaled.iter_mut().zip(SCALED) {
                values.push(assets * (low + (high - low) * rng.next()));
            }
            assets *= 0.9 + 0.3 * rng.next();
        }
    };

    for firm in 0..firms as i64 {
        add_firm(1000 + firm, 2000, "USA", &mut rng);
        add_firm(2000 + firm, 3500, "USA", &mut rng);
    }
    add_firm(9001, 6100, "USA", &mut rng);
    add_firm(9002, 2000, "CAN", &mut rng);

    let mut columns: Vec<Column> = vec![
        Series::new("gvkey".into(), gvkey).into(),
        Series::new("fyear".into(), fyear).into(),
        Series::new("indfmt".into(), indfmt).into(),
        Series::new("fic".into(), fic).into(),
        Series::new("sic".into(), sic).into(),
        Series::new("sich".into(), sich).into(),
        Series::new("conm".into(), conm).into(),
        Series::new("at".into(), at).into(),
    ];
    for ((name, _, _), values) in SCALED.iter().zip(scaled) {
        columns.push(Series::new((*name).into(), values).into());
    }
    DataFrame::new(columns).unwrap()
}

fn ff12() -> DataFrame {
    df![
        "sic" => [2000i64, 3500, 6100],
        "ff12_ind" => [1i64, 3, 11],
    ]
    .unwrap()
}

fn ff48() -> DataFrame {
    df![
        "sic" => [2000i64, 3500, 6100],
        "ff48_ind" => [2i64, 21, 45],
    ]
    .unwrap()
}

fn config(models: &[&str]) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.accruals.models = models.iter().map(|m| m.to_string()).collect();
    config
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hobart-{name}-{}", std::process::id()))
}

#[test]
fn test_prepare_sample_row_counts() {
    let prepared = prepare_sample(&raw_extract(15), &ff12(), &ff48(), &config(&["mj", "dd"])).unwrap();
    let mj = &prepared.estimates[0];
    let dd = &prepared.estimates[1];

    // Two industries over 2001-2004 with a lag, 15 firms each.
    assert_eq!(mj.model, AccrualModelKind::ModifiedJones);
    assert_eq!(mj.summary.fitted, 8);
    assert_eq!(mj.table.height(), 120);

    // Dechow-Dichev needs t-2 through t+1: 2002 and 2003 only.
    assert_eq!(dd.model, AccrualModelKind::DechowDichev);
    assert_eq!(dd.table.height(), 60);

    // Every Modified Jones residual appears once in the sample.
    let sample = &prepared.sample;
    assert_eq!(sample.height(), mj.table.height());
    assert_eq!(sample.column("mj_da").unwrap().null_count(), 0);
    assert_eq!(sample.height() - sample.column("dd_da").unwrap().null_count(), 60);

    let names: Vec<&str> = sample.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, OUTPUT_COLUMNS);
}

#[test]
fn test_base_sample_filters_applied() {
    let prepared = prepare_sample(&raw_extract(12), &ff12(), &ff48(), &config(&["mj"])).unwrap();
    let firms = prepared.sample.column("gvkey").unwrap().str().unwrap();

    assert!(firms.into_iter().flatten().all(|firm| !firm.starts_with("900")));
    let industries = prepared.sample.column("ff48_ind").unwrap().str().unwrap();
    assert!(industries.into_iter().flatten().all(|ind| ind == "2" || ind == "21"));
}

#[test]
fn test_without_dechow_dichev_columns_are_null() {
    let prepared = prepare_sample(&raw_extract(12), &ff12(), &ff48(), &config(&["mj"])).unwrap();

    assert_eq!(prepared.estimates.len(), 1);
    let n = prepared.sample.height();
    assert_eq!(n, 96);
    assert_eq!(prepared.sample.column("dd_da").unwrap().null_count(), n);
    assert_eq!(prepared.sample.column("dd_ada").unwrap().null_count(), n);
    assert_eq!(prepared.sample.column("dd_nobs").unwrap().null_count(), n);
}

#[test]
fn test_undersized_industries_leave_no_sample() {
    // Five firms per industry-year never reach the minimum of ten.
    let prepared = prepare_sample(&raw_extract(5), &ff12(), &ff48(), &config(&["mj", "dd"])).unwrap();

    assert_eq!(prepared.estimates[0].summary.fitted, 0);
    assert_eq!(prepared.estimates[0].summary.undersized, 8);
    assert_eq!(prepared.sample.height(), 0);
}

#[test]
fn test_configuration_checked_before_data() {
    let empty = DataFrame::empty();

    let result = prepare_sample(&empty, &empty, &empty, &config(&["dd"]));
    assert!(matches!(result, Err(PipelineError::Config(_))));

    let result = prepare_sample(&empty, &empty, &empty, &config(&["mj", "jones"]));
    assert!(matches!(result, Err(PipelineError::Config(_))));
}

#[test]
fn test_prepare_estimate_and_analyze_files() {
    let dir = temp_dir("pipeline");
    let input = dir.join("input");

    let mut raw = raw_extract(15);
    write_csv(&mut raw, input.join("cstat.csv")).unwrap();
    write_csv(&mut ff12(), input.join("ff12.csv")).unwrap();
    write_csv(&mut ff48(), input.join("ff48.csv")).unwrap();

    let mut config = config(&["mj", "dd"]);
    config.paths.compustat = input.join("cstat.csv");
    config.paths.fama_french_12 = input.join("ff12.csv");
    config.paths.fama_french_48 = input.join("ff48.csv");
    config.paths.sample = dir.join("generated").join("acc_sample.csv");
    config.paths.accruals_dir = Some(dir.join("accruals"));
    config.paths.results_dir = dir.join("results");

    let prepared = hobart::prepare(&config).unwrap();
    assert!(config.paths.sample.exists());
    assert!(dir.join("accruals").join("mj_accruals.csv").exists());
    assert!(dir.join("accruals").join("dd_accruals.csv").exists());

    let estimates = hobart::estimate(&config, AccrualModelKind::DechowDichev).unwrap();
    assert_eq!(estimates.table.height(), prepared.estimates[1].table.height());

    let report = hobart::analyze(&config).unwrap();
    assert_eq!(report.info.observations, 60);
    assert_eq!(report.info.unique_firms, 30);
    assert_eq!(report.info.min_fyear, 2002);
    assert_eq!(report.info.max_fyear, 2003);
    assert!(dir.join("results").join("descriptive.tex").exists());
    assert!(dir.join("results").join("correlation.tex").exists());

    std::fs::remove_dir_all(dir).ok();
}
