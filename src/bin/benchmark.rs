//! Kernel throughput: serial vs rayon-parallel passes over the packed grid

use std::time::Instant;

use gpu_life::domain::{GridStore, Seed};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Mean milliseconds per generation
fn benchmark_store(size: usize, iterations: u32, parallel: bool) -> f64 {
    let mut rng = StdRng::seed_from_u64(size as u64);
    let seed = Seed::Random { density: 30.0 }.generate(size, size, &mut rng);
    let Ok(mut store) = GridStore::allocate(size, size) else {
        return f64::NAN;
    };
    if store.load(&seed).is_err() {
        return f64::NAN;
    }

    let start = Instant::now();
    for _ in 0..iterations {
        store.tick(parallel);
    }
    start.elapsed().as_secs_f64() * 1000.0 / iterations as f64
}

/// Format large numbers with K/M/B suffixes
fn format_number(n: f64) -> String {
    if n >= 1e9 {
        format!("{:.1}B", n / 1e9)
    } else if n >= 1e6 {
        format!("{:.1}M", n / 1e6)
    } else if n >= 1e3 {
        format!("{:.1}K", n / 1e3)
    } else {
        format!("{n:.0}")
    }
}

fn main() {
    env_logger::init();
    println!("=== Life Kernel Benchmark ===\n");

    let sizes = [128, 512, 1024, 2048, 4096];
    let iterations = 20;

    println!(
        "{:>10} {:>12} {:>12} {:>10} {:>14}",
        "Size", "Serial ms", "Rayon ms", "Speedup", "Cells/s"
    );
    println!("{:-<62}", "");

    for size in sizes {
        let serial_ms = benchmark_store(size, iterations, false);
        let parallel_ms = benchmark_store(size, iterations, true);
        let cells_per_sec = (size * size) as f64 / (parallel_ms / 1000.0);

        println!(
            "{:>10} {:>12.2} {:>12.2} {:>9.1}x {:>14}",
            format!("{size}x{size}"),
            serial_ms,
            parallel_ms,
            serial_ms / parallel_ms,
            format_number(cells_per_sec)
        );
    }

    let size = 4096usize;
    let bytes = size * size * std::mem::size_of::<u32>() * 2;
    println!(
        "\nDouble buffer at {size}x{size}: {bytes} bytes ({:.1} MB)",
        bytes as f64 / 1_000_000.0
    );
}
