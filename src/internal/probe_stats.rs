//! Displacement simulation: fills tables to a range of load factors with random
//! keys and compares Robin Hood balancing against plain linear probing.
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::hash::BuildHasher;

use plotters::prelude::*;
use rand::Rng;
use robin_hood_table::{DefaultState, RobinHoodTable};

const TABLE_SIZE: usize = 1 << 16;
// Load factors from 0.1 to 0.95 in 10 steps
const NUM_LOAD_FACTORS: usize = 10;
// Insert/remove pairs in the churn phase
const CHURN_ROUNDS: usize = 20_000;

const FONT_FAMILY: &str = "sans-serif";
const COLORS: [RGBColor; 4] = [
    RGBColor(220, 50, 50),  // red
    RGBColor(50, 90, 220),  // blue
    RGBColor(50, 180, 50),  // green
    RGBColor(180, 50, 180), // magenta
];

/// Mean and worst displacement of one filled table
struct Measurement {
    mean: f64,
    max: usize,
}

// Plain linear probing without balancing, returns the displacement of the new key
fn linear_probing(table: &mut [Option<u64>], state: &DefaultState, key: u64) -> usize {
    let mask = table.len() - 1;
    let mut index = (state.hash_one(key) as usize) & mask;
    let mut displacement = 0;

    while table[index].is_some() {
        index = (index + 1) & mask;
        displacement += 1;
    }
    table[index] = Some(key);

    displacement
}

fn measure_linear(keys: &[u64]) -> Measurement {
    let state = DefaultState::default();
    let mut table = vec![None; TABLE_SIZE];
    let displacements: Vec<usize> =
        keys.iter().map(|&key| linear_probing(&mut table, &state, key)).collect();

    Measurement {
        mean: displacements.iter().sum::<usize>() as f64 / displacements.len().max(1) as f64,
        max: displacements.iter().copied().max().unwrap_or(0),
    }
}

fn measure_robin_hood(keys: &[u64]) -> Result<Measurement, Box<dyn std::error::Error>> {
    // A load factor of 1 keeps the table at TABLE_SIZE for every run below 100%
    let mut table = RobinHoodTable::with_load_factor(TABLE_SIZE, 1.0)?;
    for &key in keys {
        table.insert(key, ());
    }
    let stats = table.stats();

    Ok(Measurement { mean: stats.mean_displacement, max: stats.max_displacement })
}

// Half-fills a table, then repeatedly removes a live key and inserts a fresh one
fn churn(rng: &mut impl Rng) {
    let mut table = RobinHoodTable::with_capacity(TABLE_SIZE);
    let mut live: Vec<u64> = Vec::with_capacity(TABLE_SIZE);

    while live.len() < table.threshold() - 1 {
        let key = rng.random::<u64>();
        if table.insert(key, ()).is_none() {
            live.push(key);
        }
    }

    for round in 1..=CHURN_ROUNDS {
        let victim = live.swap_remove(rng.random_range(0..live.len()));
        table.remove(&victim);
        let key = rng.random::<u64>();
        if table.insert(key, ()).is_none() {
            live.push(key);
        }

        if round % (CHURN_ROUNDS / 4) == 0 {
            let stats = table.stats();
            println!(
                "  churn round {round}: capacity = {}, live = {}, tombstones = {}, mean = {:.2}, worst = {}",
                stats.capacity,
                stats.len,
                stats.tombstones,
                stats.mean_displacement,
                stats.max_displacement
            );
        }
    }
}

fn draw_chart(
    path: &str,
    title: &str,
    y_desc: &str,
    load_factors: &[f64],
    series: &[(&str, Vec<f64>)],
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let y_max = series
        .iter()
        .flat_map(|(_, values)| values.iter())
        .fold(0.0, |max: f64, &x| max.max(x)) *
        1.1; // 10% margin
    let x_min = load_factors.first().copied().unwrap_or(0.0);
    let x_max = load_factors.last().copied().unwrap_or(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, 35))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max.max(1.0))?;

    chart
        .configure_mesh()
        .x_desc("Load factor")
        .y_desc(y_desc)
        .axis_desc_style((FONT_FAMILY, 16))
        .draw()?;

    for (idx, (name, values)) in series.iter().enumerate() {
        let color = &COLORS[idx % COLORS.len()];
        let line_style = ShapeStyle::from(color).stroke_width(2);

        chart
            .draw_series(LineSeries::new(
                load_factors.iter().copied().zip(values.iter().copied()),
                line_style,
            ))?
            .label(*name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series(
            load_factors
                .iter()
                .copied()
                .zip(values.iter().copied())
                .map(|point| Circle::new(point, 4, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let load_factors: Vec<f64> = (0..NUM_LOAD_FACTORS)
        .map(|i| 0.1 + (0.95 - 0.1) * (i as f64) / ((NUM_LOAD_FACTORS - 1) as f64))
        .collect();
    let num_keys: Vec<usize> =
        load_factors.iter().map(|&load| (TABLE_SIZE as f64 * load) as usize).collect();

    println!("Load factors: {load_factors:.2?}");
    println!("Number of keys: {num_keys:?}");

    // Same keys for both methods
    let mut rng = rand::rng();
    let max_keys = num_keys.iter().copied().max().unwrap_or(0);
    let keys: Vec<u64> = (0..max_keys).map(|_| rng.random::<u64>()).collect();

    let mut robin_mean = Vec::with_capacity(NUM_LOAD_FACTORS);
    let mut robin_max = Vec::with_capacity(NUM_LOAD_FACTORS);
    let mut linear_mean = Vec::with_capacity(NUM_LOAD_FACTORS);
    let mut linear_max = Vec::with_capacity(NUM_LOAD_FACTORS);

    for &n_keys in &num_keys {
        let sample = &keys[..n_keys];
        let robin = measure_robin_hood(sample)?;
        let linear = measure_linear(sample);

        println!(
            "{n_keys:>6} keys: robin hood mean = {:.2} worst = {:>4} | linear mean = {:.2} worst = {:>4}",
            robin.mean, robin.max, linear.mean, linear.max
        );

        robin_mean.push(robin.mean);
        robin_max.push(robin.max as f64);
        linear_mean.push(linear.mean);
        linear_max.push(linear.max as f64);
    }

    println!("Churn at the default load factor:");
    churn(&mut rng);

    draw_chart(
        "mean_displacement.png",
        "Mean Displacement",
        "Probe steps from home slot",
        &load_factors,
        &[("Robin Hood", robin_mean), ("Linear probing", linear_mean)],
    )?;
    draw_chart(
        "worst_displacement.png",
        "Worst-Case Displacement",
        "Probe steps from home slot",
        &load_factors,
        &[("Robin Hood", robin_max), ("Linear probing", linear_max)],
    )?;

    println!("Generated plot images: mean_displacement.png, worst_displacement.png");

    Ok(())
}
