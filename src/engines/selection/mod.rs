//! Rule selection, shared by reproduction (parent choice) and deletion.

pub mod best;
pub mod roulette;
pub mod tournament;

pub use best::BestClassifierSelector;
pub use roulette::RouletteWheelSelector;
pub use tournament::{CumulativeTournamentSelector, TournamentSelector, TournamentSize};

use crate::config::SelectorKind;
use crate::engines::population::ClassifierSet;
use crate::engines::update::UpdateStrategy;
use crate::types::ComparisonMode;
use rand::RngCore;

/// Picks macroclassifier indices from a set, with replacement.
pub trait Selector<U: UpdateStrategy> {
    /// `how_many` indices into `set`; empty when `set` is empty.
    fn select(
        &self,
        how_many: usize,
        set: &ClassifierSet<U::Data>,
        strategy: &U,
        rng: &mut dyn RngCore,
    ) -> Vec<usize>;

    fn select_one(
        &self,
        set: &ClassifierSet<U::Data>,
        strategy: &U,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        if set.is_empty() {
            return None;
        }
        self.select(1, set, strategy, rng).first().copied()
    }
}

/// Orders two values under a maximizing or minimizing selector.
pub(crate) fn is_better(candidate: f64, incumbent: f64, maximize: bool) -> bool {
    if maximize {
        candidate > incumbent
    } else {
        candidate < incumbent
    }
}

pub fn build_selector<U: UpdateStrategy + 'static>(
    kind: &SelectorKind,
    mode: ComparisonMode,
    maximize: bool,
) -> Box<dyn Selector<U>> {
    match kind {
        SelectorKind::Roulette => Box::new(RouletteWheelSelector::new(mode, maximize)),
        SelectorKind::Tournament { size } => Box::new(TournamentSelector::new(
            TournamentSize::Fixed(*size),
            mode,
            maximize,
        )),
        SelectorKind::TournamentFraction { fraction } => Box::new(TournamentSelector::new(
            TournamentSize::Fraction(*fraction),
            mode,
            maximize,
        )),
        SelectorKind::CumulativeTournament { size } => Box::new(CumulativeTournamentSelector::new(
            TournamentSize::Fixed(*size),
            mode,
            maximize,
        )),
        SelectorKind::Best => Box::new(BestClassifierSelector::new(mode, maximize)),
    }
}
