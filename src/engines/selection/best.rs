use super::{is_better, Selector};
use crate::engines::population::ClassifierSet;
use crate::engines::update::UpdateStrategy;
use crate::types::ComparisonMode;
use rand::RngCore;

/// Deterministic arg-max (or arg-min) of value times numerosity.
/// Ties go to the more experienced rule when maximizing, the less experienced when minimizing.
#[derive(Debug, Clone, Copy)]
pub struct BestClassifierSelector {
    mode: ComparisonMode,
    maximize: bool,
}

impl BestClassifierSelector {
    pub fn new(mode: ComparisonMode, maximize: bool) -> Self {
        Self { mode, maximize }
    }

    fn best<U: UpdateStrategy>(&self, set: &ClassifierSet<U::Data>, strategy: &U) -> Option<usize> {
        let mut best: Option<(usize, f64, u32)> = None;
        for (index, macroclassifier) in set.iter().enumerate() {
            let classifier = macroclassifier.borrow();
            let value =
                strategy.comparison_value(&classifier, self.mode) * macroclassifier.numerosity as f64;
            let experience = classifier.experience;
            let replace = match best {
                None => true,
                Some((_, best_value, best_experience)) => {
                    is_better(value, best_value, self.maximize)
                        || (value == best_value
                            && is_better(experience as f64, best_experience as f64, self.maximize))
                }
            };
            if replace {
                best = Some((index, value, experience));
            }
        }
        best.map(|(index, _, _)| index)
    }
}

impl<U: UpdateStrategy> Selector<U> for BestClassifierSelector {
    fn select(
        &self,
        how_many: usize,
        set: &ClassifierSet<U::Data>,
        strategy: &U,
        _rng: &mut dyn RngCore,
    ) -> Vec<usize> {
        match self.best(set, strategy) {
            Some(index) => vec![index; how_many],
            None => Vec::new(),
        }
    }
}
