//! Value transforms applied to a child's `default_value()` before it enters
//! a PUCT-style selection score, keeping the exploitation term on a scale
//! comparable to the exploration term regardless of the environment's
//! native reward scale.

/// A stateless-per-action transform `f64 -> f64`, with an optional
/// `update` hook that lets the running-statistics variants (min-max,
/// z-score) track tree-wide statistics as new values are backed up.
///
/// Must not depend on which child is being scored beyond the `value`
/// argument itself — only on state accumulated via `update`.
pub trait ValueTransform: Send + Sync {
    /// Transforms a raw value into the scale used by the selection score.
    fn apply(&self, value: f64) -> f64;

    /// Folds a newly observed value (a node's `default_value()` at the
    /// time it was scored) into the transform's running statistics. A
    /// no-op for stateless transforms.
    fn update(&mut self, _value: f64) {}

    /// Create a boxed clone of this transform.
    fn clone_box(&self) -> Box<dyn ValueTransform>;
}

/// `τ(v) = v`. The default transform; used when rewards are already on a
/// scale comparable to the exploration term (e.g. normalized to `[0, 1]`).
#[derive(Debug, Clone, Default)]
pub struct IdentityTransform;

impl IdentityTransform {
    /// Creates a new identity transform.
    pub fn new() -> Self {
        IdentityTransform
    }
}

impl ValueTransform for IdentityTransform {
    fn apply(&self, value: f64) -> f64 {
        value
    }

    fn clone_box(&self) -> Box<dyn ValueTransform> {
        Box::new(self.clone())
    }
}

/// Min-max normalization using the running min/max over every value passed
/// to `update` so far. Before any values have been observed, behaves as
/// the identity transform.
#[derive(Debug, Clone)]
pub struct MinMaxTransform {
    min: Option<f64>,
    max: Option<f64>,
}

impl MinMaxTransform {
    /// Creates a transform with no running statistics yet.
    pub fn new() -> Self {
        MinMaxTransform { min: None, max: None }
    }
}

impl Default for MinMaxTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueTransform for MinMaxTransform {
    fn apply(&self, value: f64) -> f64 {
        match (self.min, self.max) {
            (Some(min), Some(max)) if max > min => (value - min) / (max - min),
            _ => value,
        }
    }

    fn update(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    fn clone_box(&self) -> Box<dyn ValueTransform> {
        Box::new(self.clone())
    }
}

/// Z-score normalization using Welford's online algorithm for running
/// mean/variance. Before at least two observations, behaves as the
/// identity transform (variance is undefined with fewer).
#[derive(Debug, Clone)]
pub struct ZScoreTransform {
    count: u64,
    mean: f64,
    m2: f64,
}

impl ZScoreTransform {
    /// Creates a transform with no running statistics yet.
    pub fn new() -> Self {
        ZScoreTransform {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    fn variance(&self) -> Option<f64> {
        if self.count < 2 {
            None
        } else {
            Some(self.m2 / self.count as f64)
        }
    }
}

impl Default for ZScoreTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueTransform for ZScoreTransform {
    fn apply(&self, value: f64) -> f64 {
        match self.variance() {
            Some(var) if var > 0.0 => (value - self.mean) / var.sqrt(),
            _ => value,
        }
    }

    fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    fn clone_box(&self) -> Box<dyn ValueTransform> {
        Box::new(self.clone())
    }
}

impl ValueTransform for Box<dyn ValueTransform> {
    fn apply(&self, value: f64) -> f64 {
        (**self).apply(value)
    }

    fn update(&mut self, value: f64) {
        (**self).update(value)
    }

    fn clone_box(&self) -> Box<dyn ValueTransform> {
        (**self).clone_box()
    }
}
