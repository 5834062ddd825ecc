//! Fit a noisy synthetic matrix and write the diagnostic figure.
//!
//! ```text
//! cargo run --example fit_synthetic -- [output.svg] [config.json]
//! ```

use flexi_logger::Logger;
use ndarray::Array2;
use profilefit_rs::{FitterConfig, ProfileFitter, SvgReporter};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::error::Error;
use std::f64::consts::PI;

fn synthetic_matrix(rows: usize, cols: usize) -> Result<Array2<f64>, Box<dyn Error>> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.5)?;

    Ok(Array2::from_shape_fn((rows, cols), |(_, c)| {
        let x = c as f64;
        let arg = (x - 25.0) / 3.0;
        let value = 200.0 / (3.0 * (2.0 * PI).sqrt()) * (-0.5 * arg * arg).exp()
            + 100.0 * (-x / 10.0).exp();
        value / rows as f64 + noise.sample(&mut rng)
    }))
}

fn main() -> Result<(), Box<dyn Error>> {
    let _logger = Logger::try_with_env_or_str("info")?.start()?;

    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| "profile_fit.svg".to_string());
    let config = match args.next() {
        Some(path) => FitterConfig::from_json_file(path)?,
        None => FitterConfig::default(),
    };

    let matrix = synthetic_matrix(16, 50)?;
    let mut reporter = SvgReporter::file(&output);
    let fit = ProfileFitter::with_config(config).fit_and_report(matrix.view(), &mut reporter)?;

    println!("{}", fit.fit_report());
    println!("{}", serde_json::to_string_pretty(&fit.fitted()?)?);
    println!("FWHM = {:.4}, height = {:.4}", fit.fwhm()?, fit.height()?);
    println!("figure written to {}", output);
    Ok(())
}
