//! Circuit construction benchmark suite

use cvqnn::circuit::{mode_range, CircuitProgram};
use cvqnn::init::{init_params, InitConfig};
use cvqnn::interferometer::{build_interferometer, build_interferometer_inverse};
use cvqnn::layout::{interferometer_param_count, linear_layer_param_count, recurrent_cell_param_count};
use cvqnn::linear::{build_linear_layer, build_linear_layer_inverse};
use cvqnn::recurrent::build_recurrent_sequence;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn header(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("BENCHMARK: {}", title);
    println!("{}", "=".repeat(60));
}

fn benchmark_interferometer(rng: &mut StdRng) -> cvqnn::Result<()> {
    header("Interferometer Build + Inverse");

    let sizes = [4, 8, 16, 32, 64];
    let init = InitConfig { stddev: 1.0 };

    for &n in &sizes {
        let params = init_params(interferometer_param_count(n)?, &init, rng)?;
        let modes = mode_range(0, n);
        let n_iters = if n <= 16 { 1000 } else { 100 };

        let start = Instant::now();
        let mut gates = 0;
        for _ in 0..n_iters {
            let mut program = CircuitProgram::new();
            build_interferometer(&mut program, &params, &modes)?;
            build_interferometer_inverse(&mut program, &params, &modes)?;
            gates = program.len();
        }
        let elapsed = start.elapsed().as_secs_f64() / n_iters as f64;

        println!("  {} modes: {:.1} μs ({} gates)", n, elapsed * 1e6, gates);
    }
    Ok(())
}

fn benchmark_linear_layer(rng: &mut StdRng) -> cvqnn::Result<()> {
    header("Linear Layer Compute/Uncompute");

    let sizes = [2, 4, 8, 16, 32];
    let init = InitConfig { stddev: 0.1 };

    for &n in &sizes {
        let params = init_params(linear_layer_param_count(n)?, &init, rng)?;
        let modes = mode_range(0, n);
        let n_iters = 500;

        let start = Instant::now();
        let mut gates = 0;
        for _ in 0..n_iters {
            let mut program = CircuitProgram::new();
            build_linear_layer(&mut program, &params, &modes)?;
            build_linear_layer_inverse(&mut program, &params, &modes)?;
            gates = program.len();
        }
        let elapsed = start.elapsed().as_secs_f64() / n_iters as f64;

        println!("  {} modes: {:.1} μs ({} gates)", n, elapsed * 1e6, gates);
    }
    Ok(())
}

fn benchmark_recurrent(rng: &mut StdRng) -> cvqnn::Result<()> {
    header("Recurrent Sequence");

    let width = 2;
    let steps = 32;
    let init = InitConfig::default();

    for &hidden in &[2, 4, 8] {
        let params = init_params(recurrent_cell_param_count(width, hidden)?, &init, rng)?;
        let sequence = vec![vec![0.1; width]; steps];
        let hidden_modes = mode_range(0, hidden);
        let working_modes = mode_range(hidden, width);
        let n_iters = 100;

        let start = Instant::now();
        let mut gates = 0;
        for _ in 0..n_iters {
            let mut program = CircuitProgram::new();
            build_recurrent_sequence(&mut program, &sequence, &params, &hidden_modes, &working_modes)?;
            gates = program.len();
        }
        let elapsed = start.elapsed().as_secs_f64() / n_iters as f64;

        println!(
            "  {} hidden, {} steps: {:.1} μs ({} gates)",
            hidden,
            steps,
            elapsed * 1e6,
            gates
        );
    }
    Ok(())
}

fn main() -> cvqnn::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("\n{}", "#".repeat(60));
    println!("#  CV Circuit Construction Benchmark Suite");
    println!("{}", "#".repeat(60));

    let mut rng = StdRng::seed_from_u64(0);
    benchmark_interferometer(&mut rng)?;
    benchmark_linear_layer(&mut rng)?;
    benchmark_recurrent(&mut rng)?;

    println!("\n{}", "=".repeat(60));
    println!("BENCHMARK COMPLETE");
    println!("{}", "=".repeat(60));
    Ok(())
}
