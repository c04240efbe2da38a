use crate::arrayops::{gridspace, ChromatogramArrays};
use crate::simulate::{simulate_chromatogram, ChromatogramSimulator, SimulatedCompound};

pub const PEAK_CENTERS: [f64; 3] = [2.0, 5.0, 8.0];

pub fn three_compounds(height: f64) -> Vec<SimulatedCompound> {
    PEAK_CENTERS
        .iter()
        .enumerate()
        .map(|(i, rt)| SimulatedCompound::new(format!("compound-{i}"), *rt, height, 0.1))
        .collect()
}

/// Three well separated peaks on a flat zero baseline
pub fn clean_three_peaks() -> ChromatogramArrays<'static> {
    simulate_chromatogram(&three_compounds(1000.0), false, false, None).unwrap()
}

/// Three tall peaks over a drifting baseline with white noise of standard deviation 2
pub fn noisy_three_peaks(seed: u64) -> ChromatogramArrays<'static> {
    ChromatogramSimulator::default()
        .with_noise_level(2.0)
        .with_drift(5.0, 20.0)
        .with_seed(seed)
        .simulate(&three_compounds(1000.0), true, true)
        .unwrap()
}

/// A single Gaussian with standard deviation `sigma` sampled every 0.01 over `0..=10`
pub fn gaussian_signal(center: f64, sigma: f64, height: f64) -> (Vec<f64>, Vec<f64>) {
    let time = gridspace(0.0, 10.0, 0.01);
    let intensity = time
        .iter()
        .map(|t| height * (-0.5 * ((t - center) / sigma).powi(2)).exp())
        .collect();
    (time, intensity)
}
