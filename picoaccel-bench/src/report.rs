use picoaccel_core::{AccelConfig, CacheStats};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRun {
    pub capacity: usize,
    pub utterances: usize,
    pub lookups: u64,
    pub tree_walks: u64,
    pub hit_rate: u8,
    pub stats: CacheStats,
    pub avg_lookup_ns: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRun {
    pub backend: String,
    pub len: u16,
    pub frames: usize,
    pub p50_round_trip_us: f64,
    pub p95_round_trip_us: f64,
    pub avg_round_trip_us: f64,
    pub max_reconstruction_error: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedPointRun {
    pub samples: usize,
    pub sqrt_max_rel_error: f64,
    pub recip_max_rel_error: f64,
    pub q15_scale_max_abs_error: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub config: AccelConfig,
    pub seed: u64,
    pub iterations: usize,
    pub cache: Vec<CacheRun>,
    pub transforms: Vec<TransformRun>,
    pub fixed_point: FixedPointRun,
}

pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let idx = ((sorted.len() - 1) as f64 * p.clamp(0.0, 1.0)).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
