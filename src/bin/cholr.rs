//! cholr driver binary
//!
//! Generates a random symmetric positive-definite matrix, factorizes it
//! through the tiled engine, and reports timing plus an optional residual
//! check. Exits non-zero when the factorization or the check fails.

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use env_logger::Env;
use log::debug;

use cholr::prelude::*;
use cholr::verify;

#[derive(Parser, Debug)]
#[command(name = "cholr", version, about = "Tiled Cholesky factorization benchmark")]
struct Args {
    /// Matrix dimension (must be a multiple of the tile size)
    #[arg(short = 'n', long)]
    size: usize,

    /// Tile dimension
    #[arg(short = 't', long, default_value_t = 128)]
    tile_size: usize,

    /// Worker count; 0 means one worker per core
    #[arg(short = 'w', long, default_value_t = 0)]
    threads: usize,

    /// Seed for the generated matrix
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Skip the residual check
    #[arg(long)]
    no_check: bool,

    /// Factorize in single precision instead of double
    #[arg(long = "f32")]
    single: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let outcome = if args.single {
        run::<f32>(&args)
    } else {
        run::<f64>(&args)
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("cholr: verification FAILED");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("cholr: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run<T: Element>(args: &Args) -> cholr::Result<bool> {
    let n = args.size;
    let ts = args.tile_size;

    debug!("generating {n}x{n} SPD matrix (seed {})", args.seed);
    let a = verify::generate_spd::<T>(n, args.seed);
    let mut grid = TileGrid::from_dense(&a, n, ts)?;

    #[cfg(feature = "rayon")]
    let parallelism = if args.threads == 1 {
        Parallelism::None
    } else {
        Parallelism::Rayon(args.threads)
    };
    #[cfg(not(feature = "rayon"))]
    let parallelism = Parallelism::None;

    let start = Instant::now();
    factorize(&mut grid, parallelism)?;
    let secs = start.elapsed().as_secs_f64();

    let mut factored = a.clone();
    grid.to_dense(&mut factored)?;

    let passed = if args.no_check {
        true
    } else {
        verify::check_factorization(&a, &factored, n)
    };

    let gflops = (n as f64).powi(3) / 3.0 / secs / 1e9;
    println!("==================== RESULTS ===================== ");
    println!("  Benchmark:             Cholesky (cholr)");
    println!("  Matrix size:           {n}x{n}");
    println!("  Tile size:             {ts}x{ts}");
    println!("  Workers:               {}", cholr::parallelism_degree(parallelism));
    println!("  Performance (gflops):  {gflops:.3}");
    println!("  Execution time (secs): {secs:.6}");
    if !args.no_check {
        println!(
            "  Verification:          {}",
            if passed { "passed" } else { "FAILED" }
        );
    }
    println!("================================================== ");

    Ok(passed)
}
