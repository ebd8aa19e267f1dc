use std::path::PathBuf;

use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};

#[derive(Parser, Debug)]
#[command(author, version, about = "Writes a noisy linear dataset as CSV", long_about = None)]
struct Args {
    #[clap(short, long, default_value = "data/linear_data.csv")]
    output: PathBuf,

    #[clap(short = 'n', long, default_value_t = 200)]
    samples: usize,

    #[clap(long, default_value_t = 3.)]
    slope: f64,

    #[clap(long, default_value_t = 2.)]
    intercept: f64,

    /// Standard deviation of the gaussian noise added to every target.
    #[clap(long, default_value_t = 0.5)]
    noise: f64,

    #[clap(long, default_value_t = 0.)]
    x_min: f64,

    #[clap(long, default_value_t = 10.)]
    x_max: f64,

    #[clap(short, long)]
    seed: Option<u64>,
}

#[derive(Debug, PartialEq, serde::Serialize)]
struct Record {
    x: f64,
    y: f64,
}

fn generate_dataset(
    args: &Args,
    rng: &mut StdRng,
) -> Result<Vec<Record>, Box<dyn std::error::Error>> {
    if !(args.x_min.is_finite() && args.x_max.is_finite()) || args.x_min >= args.x_max {
        return Err(format!("x_min ({}) must be below x_max ({})", args.x_min, args.x_max).into());
    }

    if !(args.noise >= 0. && args.noise.is_finite()) {
        return Err(format!("noise must be a finite non-negative std, got {}", args.noise).into());
    }

    let uniform = Uniform::new(args.x_min, args.x_max);
    let noise = Normal::new(0., args.noise)?;

    let records = (0..args.samples)
        .map(|_| {
            let x = uniform.sample(rng);
            let y = args.slope * x + args.intercept + noise.sample(rng);
            Record { x, y }
        })
        .collect();

    Ok(records)
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut rng = seeded_rng(args.seed);

    let records = generate_dataset(&args, &mut rng)?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(&args.output)?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(
        "wrote {} samples of y = {} * x + {} to {}",
        records.len(),
        args.slope,
        args.intercept,
        args.output.display()
    );

    Ok(())
}
