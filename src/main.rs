use std::env;
use std::io;
use std::time::Instant;

use chrono::{Duration, Utc};

use gcsignal::qc::{assign_rolling_targets, evaluate_rules, ControlTarget, QCPolicy};
use gcsignal::quantify::{
    quantitate, CalibrationCurve, CalibrationLevel, CalibrationModel, CompoundTarget,
};
use gcsignal::simulate::{ChromatogramSimulator, SimulatedCompound};
use gcsignal::text::{arrays_from_file, write_peak_table};
use gcsignal::{BaselineMethod, ChromatogramArrays, PeakDetector};

fn demo_compounds(scale: f64) -> Vec<SimulatedCompound> {
    vec![
        SimulatedCompound::new("benzene", 2.0, 1000.0 * scale, 0.1),
        SimulatedCompound::new("toluene", 5.0, 800.0 * scale, 0.1),
        SimulatedCompound::new("xylene", 8.0, 600.0 * scale, 0.1),
    ]
}

fn main() -> io::Result<()> {
    let arrays: ChromatogramArrays<'static> = match env::args().nth(1) {
        Some(path) => arrays_from_file(path)?,
        None => ChromatogramSimulator::default()
            .with_seed(1)
            .simulate(&demo_compounds(1.0), true, true)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
    };

    let detector = PeakDetector::builder()
        .prominence_threshold(10.0)
        .min_distance(0.1)
        .baseline_method(BaselineMethod::RollingMin)
        .build()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let start = Instant::now();
    let detection = detector
        .detect_arrays(&arrays)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    println!(
        "Found {} peaks in {} microseconds, noise level {:0.3}, S/N {:0.1}",
        detection.len(),
        start.elapsed().as_micros(),
        detection.noise_level,
        detection.signal_to_noise_ratio
    );
    write_peak_table(&detection.peaks, &mut io::stdout().lock())?;

    // Quantify a short run of control injections and check them against their history
    let levels: Vec<CalibrationLevel> = [0.5, 1.0, 2.0]
        .iter()
        .map(|c| {
            let compound = &demo_compounds(*c)[0];
            CalibrationLevel::new(*c * 10.0, compound.total_area())
        })
        .collect();
    let curve = CalibrationCurve::fit(&levels, CalibrationModel::Linear)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let targets = vec![CompoundTarget::new("benzene", 2.0, 0.1, curve)];

    let drift = [1.0, 1.02, 0.98, 1.01, 0.99, 1.0, 1.03, 0.97, 1.0, 1.25];
    let first_run = Utc::now() - Duration::days(drift.len() as i64);
    let mut measurements = Vec::new();
    for (i, scale) in drift.iter().enumerate() {
        let run = ChromatogramSimulator::default()
            .with_seed(100 + i as u64)
            .simulate(&demo_compounds(*scale), true, true)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let Ok(found) = detector.detect_arrays(&run) else {
            continue;
        };
        for result in quantitate(&found.peaks, &targets) {
            measurements.push((first_run + Duration::days(i as i64), result.concentration));
        }
    }
    let points = assign_rolling_targets("benzene", &measurements, 5, ControlTarget::new(10.0, 0.2));
    let evaluation = evaluate_rules(&points, &QCPolicy::default());
    for hit in evaluation.rule_hits.iter() {
        println!("{hit}");
    }
    for (analyte, result) in evaluation.analyte_results.iter() {
        println!(
            "{analyte}: {} (z = {:0.2}, flags {:?})",
            result.status,
            result.zscore,
            result.flags.iter().map(|r| r.as_str()).collect::<Vec<_>>()
        );
    }
    Ok(())
}
