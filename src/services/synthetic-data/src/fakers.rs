//! Value synthesizers shared by the template and schema generators.
//!
//! Every function draws from a caller-supplied RNG so a seeded
//! [`StdRng`] reproduces the exact same dataset.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use fake::faker::lorem::en::Word;
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EMAIL_DOMAINS: &[&str] = &[
    "example.com",
    "test.com",
    "demo.com",
    "sample.org",
    "company.net",
];

/// Builds the per-request RNG, seeded when a seed is configured
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub fn first_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    FirstName().fake_with_rng(rng)
}

pub fn last_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    LastName().fake_with_rng(rng)
}

pub fn person_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    Name().fake_with_rng(rng)
}

pub fn word<R: Rng + ?Sized>(rng: &mut R) -> String {
    Word().fake_with_rng(rng)
}

/// `first.last@domain`, lower-cased and stripped to alphanumerics
pub fn email_for<R: Rng + ?Sized>(rng: &mut R, first: &str, last: &str) -> String {
    let domain = EMAIL_DOMAINS[rng.gen_range(0..EMAIL_DOMAINS.len())];
    format!("{}.{}@{}", email_local_part(first), email_local_part(last), domain)
}

pub fn email<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = first_name(rng);
    let last = last_name(rng);
    email_for(rng, &first, &last)
}

fn email_local_part(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect();
    if cleaned.is_empty() {
        "user".to_string()
    } else {
        cleaned
    }
}

/// Random-looking identifier token: the first `len` hex characters of a UUID
pub fn uuid_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let bytes: [u8; 16] = rng.gen();
    let id = uuid::Builder::from_random_bytes(bytes).into_uuid();
    id.hyphenated().to_string().chars().take(len).collect()
}

/// Uniform float in `[low, high]` rounded to `places` decimals.
///
/// Total over every input: a non-finite bound collapses onto the finite one
/// (or zero), and a span too wide for `f64` is sampled on halved bounds.
pub fn uniform_rounded<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64, places: i32) -> f64 {
    let (low, high) = match (low.is_finite(), high.is_finite()) {
        (true, true) => (low, high),
        (true, false) => (low, low),
        (false, true) => (high, high),
        (false, false) => (0.0, 0.0),
    };
    if high <= low {
        return round_to(low, places);
    }

    let value = if (high - low).is_finite() {
        rng.gen_range(low..=high)
    } else {
        (low / 2.0 + rng.gen::<f64>() * (high / 2.0 - low / 2.0)) * 2.0
    };
    round_to(value, places).clamp(low, high)
}

/// Rounds to `places` decimals; values too large to scale come back unchanged
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Seed for the `stream`-th independent draw from a configured base seed.
///
/// Stream 0 is the base seed itself.
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    base ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Weighted random choice; weights need not sum to one
pub fn weighted_choice<R: Rng + ?Sized, T: Clone>(rng: &mut R, choices: &[(T, f64)]) -> Option<T> {
    let total_weight: f64 = choices.iter().map(|(_, weight)| weight).sum();
    if choices.is_empty() || total_weight <= 0.0 {
        return None;
    }
    let mut random_weight = rng.gen_range(0.0..total_weight);

    for (choice, weight) in choices {
        random_weight -= weight;
        if random_weight < 0.0 {
            return Some(choice.clone());
        }
    }
    choices.last().map(|(choice, _)| choice.clone())
}

pub fn choose<'a, R: Rng + ?Sized, T>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

/// Standard normal draw scaled to `mean`/`std_dev` (Box-Muller)
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// Timestamp uniformly between `start` and `end`, whole seconds
pub fn timestamp_in_range<R: Rng + ?Sized>(
    rng: &mut R,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> DateTime<Utc> {
    let (start_ts, end_ts) = (start.timestamp(), end.timestamp());
    if end_ts <= start_ts {
        return start;
    }
    let ts = rng.gen_range(start_ts..=end_ts);
    DateTime::from_timestamp(ts, 0).unwrap_or(start)
}

/// Calendar date between `days_back` days before and `days_ahead` days after `now`
pub fn date_around<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    days_back: i64,
    days_ahead: i64,
) -> NaiveDate {
    let offset = rng.gen_range(-days_back..=days_ahead);
    (now + ChronoDuration::days(offset)).date_naive()
}

/// Generic synthesized date, anywhere in the last thirty years
pub fn any_date<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> NaiveDate {
    date_around(rng, now, 365 * 30, 0)
}
