//! Rejection time must grow linearly with input length.
//!
//! Each case is timed at sizes 10 through 10^5, growing tenfold per step. A
//! quadratic matcher takes roughly 100 times longer per step; a linear one
//! roughly 10 times, until the timer floor stops mattering.

use std::time::{Duration, Instant};

use uri_grammar::{Component, rfc2396_parser};

const SIZES: [usize; 5] = [10, 100, 1_000, 10_000, 100_000];
const RUNS: usize = 5;

/// Timer resolution floor, so a near-zero base does not inflate the ratio
const FLOOR: Duration = Duration::from_micros(50);

fn fastest(mut run: impl FnMut()) -> Duration {
    (0..RUNS)
        .map(|_| {
            let start = Instant::now();
            run();
            start.elapsed()
        })
        .min()
        .unwrap_or_default()
        .max(FLOOR)
}

fn assert_linear(name: &str, timings: &[Duration]) {
    // Each step grows the input tenfold; quadratic work would grow a hundredfold
    for (step, pair) in timings.windows(2).enumerate() {
        let growth = SIZES[step + 1] / SIZES[step];
        let limit = pair[0] * u32::try_from(growth * 5).unwrap();
        assert!(
            pair[1] <= limit,
            "{name}: {:?} at size {} exceeds {limit:?} (size {} took {:?}), timings {timings:?}",
            pair[1],
            SIZES[step + 1],
            SIZES[step],
            pair[0]
        );
    }
    let (first, last) = (timings[0], timings[timings.len() - 1]);
    let growth = SIZES[SIZES.len() - 1] / SIZES[0];
    let limit = first * u32::try_from(growth * 20).unwrap();
    assert!(
        last <= limit,
        "{name}: {last:?} at size {} exceeds {limit:?} (base {first:?}), timings {timings:?}",
        SIZES[SIZES.len() - 1]
    );
}

#[test]
fn legacy_split_rejects_padded_nul_in_linear_time() {
    let parser = rfc2396_parser();
    let timings: Vec<Duration> = SIZES
        .iter()
        .map(|&n| {
            let input = format!("{}\0", " ".repeat(n));
            fastest(|| assert!(parser.split(&input).is_err()))
        })
        .collect();
    assert_linear("legacy split", &timings);
}

#[test]
fn port_setter_rejects_padded_letter_in_linear_time() {
    let uri = uri_grammar::rfc3986_parser().parse("http://my.example.com").unwrap();
    let timings: Vec<Duration> = SIZES
        .iter()
        .map(|&n| {
            let port = format!("{}a", "\t".repeat(n));
            fastest(|| {
                let mut uri = uri.clone();
                let err = uri.set_port_str(&port).unwrap_err();
                assert_eq!(err.component, Component::Port);
            })
        })
        .collect();
    assert_linear("port setter", &timings);
}
