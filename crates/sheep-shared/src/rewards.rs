//! Reward box tables and the weighted sampler that draws from them.
//!
//! Every table is plain data: a list of outcomes with relative weights.
//! One routine, [`pick`], turns a uniform draw in `[0, 1)` into an outcome,
//! so the probabilities live in exactly one place per box.

use rand::Rng;

use crate::constants::PREMIUM_BOX_COST_GEMS;
use crate::models::Collectible;
use crate::types::{BoxKind, Rarity};

/// Source of uniform floats in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// One outcome of a weighted table. Weights are relative and need not sum
/// to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weighted<T> {
    pub weight: f64,
    pub outcome: T,
}

const fn w<T>(weight: f64, outcome: T) -> Weighted<T> {
    Weighted { weight, outcome }
}

/// Map a uniform draw `r` onto `table` by cumulative weight.
///
/// Panics on an empty table; every table in this module is non-empty.
pub fn pick<T>(table: &[Weighted<T>], r: f64) -> &T {
    let total: f64 = table.iter().map(|e| e.weight).sum();
    let target = r * total;
    let mut cumulative = 0.0;
    for entry in table {
        cumulative += entry.weight;
        if target < cumulative {
            return &entry.outcome;
        }
    }
    // r is below 1.0, so only rounding can land here.
    &table[table.len() - 1].outcome
}

pub fn sample<'a, T, R: RandomSource + ?Sized>(table: &'a [Weighted<T>], rng: &mut R) -> &'a T {
    pick(table, rng.next_unit())
}

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountRange {
    pub min: u64,
    pub max: u64,
}

impl AmountRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// `min + floor(r * (max - min + 1))`, clamped to `max`.
    pub fn at(&self, r: f64) -> u64 {
        let span = (self.max - self.min + 1) as f64;
        (self.min + (r * span).floor() as u64).min(self.max)
    }

    pub fn sample<R: RandomSource + ?Sized>(&self, rng: &mut R) -> u64 {
        self.at(rng.next_unit())
    }

    pub fn contains(&self, amount: u64) -> bool {
        (self.min..=self.max).contains(&amount)
    }
}

/// First-level outcome of a single roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollKind {
    Coins(AmountRange),
    Gems(AmountRange),
    Collectible,
}

#[derive(Debug, Clone, Copy)]
pub struct BoxTable {
    pub kind: BoxKind,
    pub rolls: u32,
    /// Gem price; zero for the daily box.
    pub gem_cost: u64,
    pub outcomes: &'static [Weighted<RollKind>],
    /// Rarity split inside the collectible branch.
    pub rarities: &'static [Weighted<Rarity>],
    /// Used when the drawn rarity has no catalog items.
    pub fallback_gems: AmountRange,
}

const DAILY_GEMS: AmountRange = AmountRange::new(2, 8);
const PREMIUM_GEMS: AmountRange = AmountRange::new(5, 15);

pub const DAILY_BOX: BoxTable = BoxTable {
    kind: BoxKind::Daily,
    rolls: 2,
    gem_cost: 0,
    outcomes: &[
        w(0.55, RollKind::Coins(AmountRange::new(10, 30))),
        w(0.35, RollKind::Gems(DAILY_GEMS)),
        w(0.10, RollKind::Collectible),
    ],
    rarities: &[
        w(0.70, Rarity::Normal),
        w(0.20, Rarity::Epic),
        w(0.10, Rarity::Legendary),
    ],
    fallback_gems: DAILY_GEMS,
};

pub const PREMIUM_BOX: BoxTable = BoxTable {
    kind: BoxKind::Premium,
    rolls: 1,
    gem_cost: PREMIUM_BOX_COST_GEMS,
    outcomes: &[
        w(0.20, RollKind::Coins(AmountRange::new(20, 40))),
        w(0.25, RollKind::Gems(PREMIUM_GEMS)),
        w(0.55, RollKind::Collectible),
    ],
    // Shares of the whole roll: 35% / 15% / 5%.
    rarities: &[
        w(0.35, Rarity::Normal),
        w(0.15, Rarity::Epic),
        w(0.05, Rarity::Legendary),
    ],
    fallback_gems: PREMIUM_GEMS,
};

pub fn table_for(kind: BoxKind) -> &'static BoxTable {
    match kind {
        BoxKind::Daily => &DAILY_BOX,
        BoxKind::Premium => &PREMIUM_BOX,
    }
}

/// What a single roll produced, before ownership is considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prize {
    Coins(u64),
    Gems(u64),
    Collectible(Collectible),
}

impl BoxTable {
    /// Draw one roll against `catalog`.
    pub fn roll<R: RandomSource + ?Sized>(&self, catalog: &[Collectible], rng: &mut R) -> Prize {
        match *sample(self.outcomes, rng) {
            RollKind::Coins(range) => Prize::Coins(range.sample(rng)),
            RollKind::Gems(range) => Prize::Gems(range.sample(rng)),
            RollKind::Collectible => {
                let rarity = *sample(self.rarities, rng);
                let pool: Vec<&Collectible> = catalog.iter().filter(|c| c.rarity == rarity).collect();
                if pool.is_empty() {
                    return Prize::Gems(self.fallback_gems.sample(rng));
                }
                let idx = ((rng.next_unit() * pool.len() as f64) as usize).min(pool.len() - 1);
                Prize::Collectible(pool[idx].clone())
            }
        }
    }

    /// All rolls for one opening.
    pub fn open<R: RandomSource + ?Sized>(&self, catalog: &[Collectible], rng: &mut R) -> Vec<Prize> {
        (0..self.rolls).map(|_| self.roll(catalog, rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::collectibles::default_catalog;

    const TRIALS: usize = 100_000;
    const TOLERANCE: f64 = 0.01;

    fn assert_share(label: &str, count: usize, total: usize, expected: f64) {
        let share = count as f64 / total as f64;
        assert!(
            (share - expected).abs() <= TOLERANCE,
            "{label}: got {share:.4}, expected {expected:.4}"
        );
    }

    /// Tallies coins / gems / collectibles and the rarity of each collectible.
    fn tally(table: &BoxTable, seed: u64) -> ([usize; 3], [usize; 3]) {
        let catalog = default_catalog();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut kinds = [0usize; 3];
        let mut rarities = [0usize; 3];
        for _ in 0..TRIALS {
            match table.roll(&catalog, &mut rng) {
                Prize::Coins(_) => kinds[0] += 1,
                Prize::Gems(_) => kinds[1] += 1,
                Prize::Collectible(c) => {
                    kinds[2] += 1;
                    match c.rarity {
                        Rarity::Normal => rarities[0] += 1,
                        Rarity::Epic => rarities[1] += 1,
                        Rarity::Legendary => rarities[2] += 1,
                        Rarity::Free => panic!("free item {} rolled", c.id),
                    }
                }
            }
        }
        (kinds, rarities)
    }

    #[test]
    fn pick_walks_cumulative_weights() {
        let table = [w(1.0, 'a'), w(2.0, 'b'), w(1.0, 'c')];
        assert_eq!(*pick(&table, 0.0), 'a');
        assert_eq!(*pick(&table, 0.24), 'a');
        assert_eq!(*pick(&table, 0.25), 'b');
        assert_eq!(*pick(&table, 0.74), 'b');
        assert_eq!(*pick(&table, 0.75), 'c');
        assert_eq!(*pick(&table, 0.999_999), 'c');
    }

    #[test]
    fn amount_range_covers_both_ends() {
        let range = AmountRange::new(10, 30);
        assert_eq!(range.at(0.0), 10);
        assert_eq!(range.at(0.999_999), 30);
        assert_eq!(range.at(0.5), 20);

        let mut rng = StdRng::seed_from_u64(7);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..10_000 {
            let v = range.sample(&mut rng);
            assert!(range.contains(v));
            seen_min |= v == 10;
            seen_max |= v == 30;
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn daily_box_distribution() {
        let (kinds, rarities) = tally(&DAILY_BOX, 42);
        assert_share("coins", kinds[0], TRIALS, 0.55);
        assert_share("gems", kinds[1], TRIALS, 0.35);
        assert_share("collectible", kinds[2], TRIALS, 0.10);

        // ~10k collectible draws; the sub-split gets a wider margin.
        let n = kinds[2];
        let loose = |label: &str, count: usize, expected: f64| {
            let share = count as f64 / n as f64;
            assert!((share - expected).abs() <= 0.02, "{label}: {share:.4}");
        };
        loose("normal", rarities[0], 0.70);
        loose("epic", rarities[1], 0.20);
        loose("legendary", rarities[2], 0.10);
    }

    #[test]
    fn premium_box_distribution() {
        let (kinds, rarities) = tally(&PREMIUM_BOX, 1337);
        assert_share("coins", kinds[0], TRIALS, 0.20);
        assert_share("gems", kinds[1], TRIALS, 0.25);
        assert_share("collectible", kinds[2], TRIALS, 0.55);

        assert_share("normal", rarities[0], TRIALS, 0.35);
        assert_share("epic", rarities[1], TRIALS, 0.15);
        assert_share("legendary", rarities[2], TRIALS, 0.05);
    }

    #[test]
    fn amounts_stay_in_table_ranges() {
        let catalog = default_catalog();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5_000 {
            match DAILY_BOX.roll(&catalog, &mut rng) {
                Prize::Coins(n) => assert!((10..=30).contains(&n)),
                Prize::Gems(n) => assert!((2..=8).contains(&n)),
                Prize::Collectible(_) => {}
            }
            match PREMIUM_BOX.roll(&catalog, &mut rng) {
                Prize::Coins(n) => assert!((20..=40).contains(&n)),
                Prize::Gems(n) => assert!((5..=15).contains(&n)),
                Prize::Collectible(_) => {}
            }
        }
    }

    #[test]
    fn empty_rarity_falls_back_to_gems() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2_000 {
            match PREMIUM_BOX.roll(&[], &mut rng) {
                Prize::Collectible(c) => panic!("rolled {} from an empty catalog", c.id),
                Prize::Gems(n) => assert!(PREMIUM_GEMS.contains(n)),
                Prize::Coins(_) => {}
            }
        }
    }

    #[test]
    fn box_roll_counts() {
        let catalog = default_catalog();
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(DAILY_BOX.open(&catalog, &mut rng).len(), 2);
        assert_eq!(PREMIUM_BOX.open(&catalog, &mut rng).len(), 1);
        assert_eq!(table_for(BoxKind::Premium).gem_cost, 40);
    }
}
