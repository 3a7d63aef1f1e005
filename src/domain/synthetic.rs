//! Synthetic field generators for fake experiments.

use rand::Rng;
use rand::seq::IndexedRandom;

const ADJECTIVES: &[&str] = &[
    "Adaptive",
    "Blind",
    "Comparative",
    "Controlled",
    "Longitudinal",
    "Pilot",
    "Randomized",
    "Rapid",
    "Sequential",
    "Stochastic",
];

const SUBJECTS: &[&str] = &[
    "Bandit",
    "Checkout",
    "Crystal",
    "Enzyme",
    "Latency",
    "Onboarding",
    "Photon",
    "Pricing",
    "Protein",
    "Retention",
    "Soil",
    "Sorting",
];

const METHODS: &[&str] = &[
    "Analysis",
    "Assay",
    "Benchmark",
    "Probe",
    "Rollout",
    "Sweep",
    "Survey",
    "Trial",
];

const GOALS: &[&str] = &[
    "measure the effect of",
    "compare baselines for",
    "estimate the variance of",
    "validate assumptions about",
    "reduce the cost of",
    "stress-test",
];

const AUDIENCES: &[&str] = &[
    "a small control group",
    "two matched cohorts",
    "weekend traffic",
    "the staging cluster",
    "archived samples",
    "volunteer participants",
];

const SALARY_RANGE: std::ops::RangeInclusive<u32> = 500..=20_000;
const DURATION_RANGE: std::ops::RangeInclusive<u32> = 1..=365;

fn pick<'a, R: Rng + ?Sized>(words: &[&'a str], rng: &mut R) -> &'a str {
    words.choose(rng).copied().unwrap_or_default()
}

/// Generates a three-word title such as `"Randomized Pricing Trial"`.
pub fn synthetic_title<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{} {} {}",
        pick(ADJECTIVES, rng),
        pick(SUBJECTS, rng),
        pick(METHODS, rng)
    )
}

/// Generates a one-sentence description.
pub fn synthetic_description<R: Rng + ?Sized>(rng: &mut R) -> String {
    let subject = pick(SUBJECTS, rng).to_lowercase();
    format!(
        "A {} to {} {subject} using {}.",
        pick(METHODS, rng).to_lowercase(),
        pick(GOALS, rng),
        pick(AUDIENCES, rng)
    )
}

/// Generates a cost in whole currency units.
pub fn synthetic_salary<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    f64::from(rng.random_range(SALARY_RANGE))
}

/// Generates a duration in days.
pub fn synthetic_duration<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(DURATION_RANGE)
}
