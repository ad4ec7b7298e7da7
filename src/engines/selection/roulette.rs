use super::Selector;
use crate::engines::population::ClassifierSet;
use crate::engines::update::UpdateStrategy;
use crate::types::ComparisonMode;
use log::warn;
use rand::{Rng, RngCore};

/// Roulette wheel selection: probability proportional to numerosity times value
/// (or its inverse when minimizing).
#[derive(Debug, Clone, Copy)]
pub struct RouletteWheelSelector {
    mode: ComparisonMode,
    maximize: bool,
}

impl RouletteWheelSelector {
    pub fn new(mode: ComparisonMode, maximize: bool) -> Self {
        Self { mode, maximize }
    }

    /// Slot sizes of the wheel, one per macroclassifier.
    ///
    /// When minimizing, rules at or below zero take the whole wheel (by
    /// numerosity); otherwise slots are inverse values scaled by the smallest
    /// one, so they stay within (0, 1].
    fn weights<U: UpdateStrategy>(&self, set: &ClassifierSet<U::Data>, strategy: &U) -> Vec<f64> {
        let weighted: Vec<f64> = set
            .iter()
            .map(|m| m.numerosity as f64 * strategy.comparison_value(&m.borrow(), self.mode))
            .collect();
        if self.maximize {
            return weighted.into_iter().map(|w| w.max(0.0)).collect();
        }

        if weighted.iter().any(|w| *w <= 0.0) {
            return set
                .iter()
                .zip(&weighted)
                .map(|(m, w)| if *w <= 0.0 { m.numerosity as f64 } else { 0.0 })
                .collect();
        }
        let smallest = weighted.iter().copied().fold(f64::INFINITY, f64::min);
        weighted.into_iter().map(|w| smallest / w).collect()
    }

    fn cumulative_weights<U: UpdateStrategy>(
        &self,
        set: &ClassifierSet<U::Data>,
        strategy: &U,
    ) -> Vec<f64> {
        let mut running = 0.0;
        let mut cumulative: Vec<f64> = self
            .weights(set, strategy)
            .into_iter()
            .map(|w| {
                running += w;
                running
            })
            .collect();

        let total = cumulative.last().copied().unwrap_or(0.0);
        if !(total > 0.0 && total.is_finite()) {
            warn!(
                "Roulette wheel over {} rules has total weight {}, falling back to numerosity",
                set.len(),
                total
            );
            running = 0.0;
            cumulative = set
                .iter()
                .map(|m| {
                    running += m.numerosity as f64;
                    running
                })
                .collect();
        }
        cumulative
    }
}

impl<U: UpdateStrategy> Selector<U> for RouletteWheelSelector {
    fn select(
        &self,
        how_many: usize,
        set: &ClassifierSet<U::Data>,
        strategy: &U,
        rng: &mut dyn RngCore,
    ) -> Vec<usize> {
        if set.is_empty() {
            return Vec::new();
        }
        let cumulative = self.cumulative_weights(set, strategy);
        let total = cumulative[cumulative.len() - 1];
        let last = cumulative.len() - 1;

        (0..how_many)
            .map(|_| {
                let spin = rng.gen::<f64>() * total;
                cumulative.partition_point(|c| *c <= spin).min(last)
            })
            .collect()
    }
}
