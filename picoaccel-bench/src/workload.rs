//! Synthetic workloads standing in for a real synthesis run.
//!
//! Utterances are drawn from a small random lexicon with a skewed word
//! distribution, so common words (and their triphones) recur the way they do
//! in running text.

use std::time::Instant;

use anyhow::Context;
use picoaccel_core::{
    recip_approx, sqrt_approx, AccelConfig, BackendKind, DtCache, PhonemeContext, SpectralContext,
    Q15,
};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};

use crate::report::{mean, percentile, CacheRun, FixedPointRun, TransformRun};

const PHONEME_INVENTORY: u8 = 40;
const LEXICON_SIZE: usize = 96;
// Must stay below the probe window: every tree of one context shares a primary slot.
const TREES_PER_PHONEME: u16 = 3;

type Word = Vec<u8>;

fn lexicon(rng: &mut StdRng) -> Vec<Word> {
    (0..LEXICON_SIZE)
        .map(|_| {
            let len = rng.gen_range(2..7);
            (0..len).map(|_| rng.gen_range(1..PHONEME_INVENTORY)).collect()
        })
        .collect()
}

/// Word index biased toward the front of the lexicon.
fn skewed_word(rng: &mut StdRng) -> usize {
    let u: f64 = rng.gen();
    ((u * u) * LEXICON_SIZE as f64) as usize
}

fn utterance(rng: &mut StdRng, words: &[Word]) -> Vec<PhonemeContext> {
    let mut phones: Vec<(u8, u8)> = Vec::new();
    for _ in 0..rng.gen_range(6..14) {
        let word = &words[skewed_word(rng).min(words.len() - 1)];
        phones.extend(word.iter().enumerate().map(|(pos, &p)| (p, pos as u8)));
    }
    (0..phones.len())
        .map(|i| {
            let (phoneme, position) = phones[i];
            PhonemeContext {
                phoneme,
                prev_phoneme: if i == 0 { 0 } else { phones[i - 1].0 },
                next_phoneme: phones.get(i + 1).map_or(0, |&(p, _)| p),
                stress: u8::from(position == 0),
                position,
            }
        })
        .collect()
}

/// Stand-in for a decision-tree walk: deterministic, deliberately not free.
fn walk_tree(ctx: &PhonemeContext, tree: u16) -> u16 {
    let mut node = ctx.fingerprint() ^ tree as u32;
    for _ in 0..24 {
        node = node.rotate_left(5).wrapping_mul(0x9E37_79B1);
    }
    (node & 0x3FF) as u16
}

pub fn run_cache<const N: usize>(rng: &mut StdRng, utterances: usize) -> anyhow::Result<CacheRun> {
    let mut cache = DtCache::<N>::initialize().context("allocating decision-tree cache")?;
    let words = lexicon(rng);
    let mut lookups = 0u64;
    let mut tree_walks = 0u64;

    let started = Instant::now();
    for _ in 0..utterances {
        for ctx in utterance(rng, &words) {
            let fp = ctx.fingerprint();
            for tree in 0..TREES_PER_PHONEME {
                lookups += 1;
                cache.get_or_insert_with(fp, tree, || {
                    tree_walks += 1;
                    walk_tree(&ctx, tree)
                });
            }
        }
    }
    let elapsed_ns = started.elapsed().as_nanos() as f64;

    info!(
        capacity = N,
        hit_rate = cache.hit_rate(),
        evictions = cache.stats().evictions,
        "cache workload finished"
    );
    Ok(CacheRun {
        capacity: N,
        utterances,
        lookups,
        tree_walks,
        hit_rate: cache.hit_rate(),
        stats: cache.stats(),
        avg_lookup_ns: if lookups == 0 {
            0.0
        } else {
            elapsed_ns / lookups as f64
        },
    })
}

pub fn run_transform(
    rng: &mut StdRng,
    kind: BackendKind,
    len: u16,
    frames: usize,
) -> anyhow::Result<TransformRun> {
    let mut ctx = SpectralContext::initialize(kind, len)
        .with_context(|| format!("initializing {kind:?} transform of length {len}"))?;
    let backend = ctx.backend_name().unwrap_or("unknown").to_string();
    let n = len as usize;

    let mut re = vec![0.0f32; n];
    let mut im = vec![0.0f32; n];
    let mut latencies_us = Vec::with_capacity(frames);
    let mut max_err = 0.0f32;

    for _ in 0..frames {
        let original: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
        re.copy_from_slice(&original);

        let started = Instant::now();
        ctx.forward(&mut re, &mut im)?;
        ctx.inverse(&mut re, &im)?;
        latencies_us.push(started.elapsed().as_secs_f64() * 1e6);

        for (got, want) in re.iter().zip(&original) {
            max_err = max_err.max((got - want).abs());
        }
    }
    ctx.deallocate();

    debug!(backend = %backend, len, max_err, "transform workload finished");
    Ok(TransformRun {
        backend,
        len,
        frames,
        p50_round_trip_us: percentile(&latencies_us, 0.50),
        p95_round_trip_us: percentile(&latencies_us, 0.95),
        avg_round_trip_us: mean(&latencies_us),
        max_reconstruction_error: max_err,
    })
}

/// Accuracy of the fixed-point approximations over the useful input range.
pub fn run_fixed_point(rng: &mut StdRng, samples: usize) -> FixedPointRun {
    let mut sqrt_err = 0.0f64;
    let mut recip_err = 0.0f64;
    let mut scale_err = 0.0f32;

    for _ in 0..samples {
        let x: f32 = rng.gen_range(0.2..0.99);
        let q = Q15::from_f32(x);
        let exact_x = q.to_f32() as f64;

        let s = sqrt_approx(q).to_f32() as f64;
        sqrt_err = sqrt_err.max((s - exact_x.sqrt()).abs() / exact_x.sqrt());

        let r = recip_approx(q) as f64 / Q15::ONE_WIDE as f64;
        recip_err = recip_err.max((r - 1.0 / exact_x).abs() * exact_x);

        let gain: f32 = rng.gen_range(-1.0..1.0);
        let fixed = q.mul(Q15::from_f32(gain)).to_f32();
        scale_err = scale_err.max((fixed - x * gain).abs());
    }

    FixedPointRun {
        samples,
        sqrt_max_rel_error: sqrt_err,
        recip_max_rel_error: recip_err,
        q15_scale_max_abs_error: scale_err,
    }
}

/// The transform configurations to measure: the configured one first, then
/// the other backend at the same length.
pub fn transform_matrix(config: &AccelConfig) -> Vec<(BackendKind, u16)> {
    let other = match config.backend {
        BackendKind::Generic => BackendKind::Accelerated,
        BackendKind::Accelerated => BackendKind::Generic,
    };
    vec![
        (config.backend, config.transform_len),
        (other, config.transform_len),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use picoaccel_core::cache::{DESKTOP_CAPACITY, EMBEDDED_CAPACITY};
    use rand::SeedableRng;

    #[test]
    fn repeated_words_produce_cache_hits() {
        let small = run_cache::<EMBEDDED_CAPACITY>(&mut StdRng::seed_from_u64(1), 50).unwrap();
        let large = run_cache::<DESKTOP_CAPACITY>(&mut StdRng::seed_from_u64(1), 50).unwrap();
        assert_eq!(small.lookups, large.lookups);
        for run in [&small, &large] {
            assert!(run.tree_walks < run.lookups, "{run:?}");
            assert_eq!(run.stats.misses as u64, run.tree_walks);
            assert!(run.hit_rate > 0);
        }
    }

    #[test]
    fn transform_round_trip_is_accurate() {
        let mut rng = StdRng::seed_from_u64(2);
        for kind in [BackendKind::Generic, BackendKind::Accelerated] {
            let run = run_transform(&mut rng, kind, 256, 8).unwrap();
            assert!(run.max_reconstruction_error < 1e-4, "{run:?}");
        }
    }

    #[test]
    fn fixed_point_errors_are_small() {
        let run = run_fixed_point(&mut StdRng::seed_from_u64(3), 500);
        assert!(run.sqrt_max_rel_error < 0.01);
        assert!(run.recip_max_rel_error < 0.01);
        assert!(run.q15_scale_max_abs_error < 1e-3);
    }
}
