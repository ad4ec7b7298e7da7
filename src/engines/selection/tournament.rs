use super::{is_better, Selector};
use crate::engines::population::ClassifierSet;
use crate::engines::update::UpdateStrategy;
use crate::types::ComparisonMode;
use rand::{Rng, RngCore};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TournamentSize {
    Fixed(usize),
    /// Fraction of the set's total numerosity, at least one participant.
    Fraction(f64),
}

impl TournamentSize {
    pub fn participants(&self, total_numerosity: usize) -> usize {
        match *self {
            TournamentSize::Fixed(size) => size.max(1),
            TournamentSize::Fraction(fraction) => {
                ((total_numerosity as f64 * fraction).floor() as usize).max(1)
            }
        }
    }
}

/// Draws micro-classifier indices uniformly, so a rule enters the tournament
/// in proportion to its numerosity.
fn draw_participants(size: TournamentSize, total_numerosity: usize, rng: &mut dyn RngCore) -> Vec<usize> {
    let mut participants: Vec<usize> = (0..size.participants(total_numerosity))
        .map(|_| rng.gen_range(0..total_numerosity))
        .collect();
    participants.sort_unstable();
    participants
}

/// Tournament that maps sorted participants to rules by walking the set once.
#[derive(Debug, Clone, Copy)]
pub struct TournamentSelector {
    size: TournamentSize,
    mode: ComparisonMode,
    maximize: bool,
}

impl TournamentSelector {
    pub fn new(size: TournamentSize, mode: ComparisonMode, maximize: bool) -> Self {
        Self {
            size,
            mode,
            maximize,
        }
    }

    fn tournament<U: UpdateStrategy>(
        &self,
        set: &ClassifierSet<U::Data>,
        strategy: &U,
        participants: &[usize],
    ) -> usize {
        let mut best_value = if self.maximize {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        let mut best_index = None;
        let mut upper_micro = 0;
        let mut next = 0;

        for (index, macroclassifier) in set.iter().enumerate() {
            if next == participants.len() {
                break;
            }
            upper_micro += macroclassifier.numerosity;
            while next < participants.len() && participants[next] < upper_micro {
                let value = strategy.comparison_value(&macroclassifier.borrow(), self.mode);
                if is_better(value, best_value, self.maximize) {
                    best_value = value;
                    best_index = Some(index);
                }
                next += 1;
            }
        }
        best_index.unwrap_or(0)
    }
}

impl<U: UpdateStrategy> Selector<U> for TournamentSelector {
    fn select(
        &self,
        how_many: usize,
        set: &ClassifierSet<U::Data>,
        strategy: &U,
        rng: &mut dyn RngCore,
    ) -> Vec<usize> {
        if set.is_empty() || set.total_numerosity() == 0 {
            return Vec::new();
        }
        (0..how_many)
            .map(|_| {
                let participants = draw_participants(self.size, set.total_numerosity(), rng);
                self.tournament(set, strategy, &participants)
            })
            .collect()
    }
}

/// Tournament that maps each participant through a cumulative numerosity table.
/// The first participant is the initial winner; later ones must be strictly better.
#[derive(Debug, Clone, Copy)]
pub struct CumulativeTournamentSelector {
    size: TournamentSize,
    mode: ComparisonMode,
    maximize: bool,
}

impl CumulativeTournamentSelector {
    pub fn new(size: TournamentSize, mode: ComparisonMode, maximize: bool) -> Self {
        Self {
            size,
            mode,
            maximize,
        }
    }

    fn macro_index(micro_index: usize, cumulative: &[usize]) -> usize {
        cumulative
            .partition_point(|c| *c <= micro_index)
            .min(cumulative.len() - 1)
    }
}

impl<U: UpdateStrategy> Selector<U> for CumulativeTournamentSelector {
    fn select(
        &self,
        how_many: usize,
        set: &ClassifierSet<U::Data>,
        strategy: &U,
        rng: &mut dyn RngCore,
    ) -> Vec<usize> {
        if set.is_empty() || set.total_numerosity() == 0 {
            return Vec::new();
        }
        let cumulative: Vec<usize> = set
            .iter()
            .scan(0, |running, m| {
                *running += m.numerosity;
                Some(*running)
            })
            .collect();
        let value_of = |index: usize| strategy.comparison_value(&set.classifier(index), self.mode);

        (0..how_many)
            .map(|_| {
                let participants = draw_participants(self.size, set.total_numerosity(), rng);
                let mut winner = Self::macro_index(participants[0], &cumulative);
                let mut winner_value = value_of(winner);
                for micro in &participants[1..] {
                    let candidate = Self::macro_index(*micro, &cumulative);
                    let value = value_of(candidate);
                    if is_better(value, winner_value, self.maximize) {
                        winner = candidate;
                        winner_value = value;
                    }
                }
                winner
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tournament_size_fraction_has_floor_of_one() {
        assert_eq!(TournamentSize::Fraction(0.1).participants(5), 1);
        assert_eq!(TournamentSize::Fraction(0.5).participants(9), 4);
        assert_eq!(TournamentSize::Fixed(3).participants(100), 3);
    }

    #[test]
    fn test_macro_index_walks_cumulative_table() {
        let cumulative = [2, 3, 7];
        assert_eq!(CumulativeTournamentSelector::macro_index(0, &cumulative), 0);
        assert_eq!(CumulativeTournamentSelector::macro_index(1, &cumulative), 0);
        assert_eq!(CumulativeTournamentSelector::macro_index(2, &cumulative), 1);
        assert_eq!(CumulativeTournamentSelector::macro_index(6, &cumulative), 2);
    }
}
