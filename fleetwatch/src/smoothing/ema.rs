//! Exponential moving average

/// Exponentially weighted moving average with fixed smoothing factor.
///
/// Higher `alpha` weights recent samples more heavily. The first sample
/// becomes the initial average.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    /// Folds one sample into the average and returns the updated value.
    pub fn update(&mut self, sample: f64) -> f64 {
        let next = match self.value {
            None => sample,
            Some(previous) => self.alpha * sample + (1.0 - self.alpha) * previous,
        };
        self.value = Some(next);
        next
    }

    /// Current average, None before the first sample.
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}
