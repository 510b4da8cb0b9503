//! Mutable game state: levels, resources, points and the cached rates.
use std::sync::Arc;

use serde::Serialize;

use crate::constants::UNREACHABLE_DELAY_SECS;
use crate::definition::GameDefinition;
use crate::error::GameError;
use crate::upgrade::{ProductionMode, RateModifiers, Upgrade};

/// Percentage change in every rate that one more level of an upgrade brings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateBoost {
    pub resources: Vec<f64>,
    pub points: f64,
}

/// A game in progress.
///
/// Cloning copies the amounts, levels and modes and shares the definition,
/// which is how what-if branches are explored.
#[derive(Debug, Clone)]
pub struct GameState {
    def: Arc<GameDefinition>,
    levels: Vec<usize>,
    modes: Vec<ProductionMode>,
    amounts: Vec<f64>,
    rates: Vec<f64>,
    point_rate: f64,
    external_bonus: Vec<f64>,
    time: f64,
    points: f64,
}

impl GameState {
    /// Fresh state at time zero. Upgrades with a free first level start at
    /// level 1.
    #[must_use]
    pub fn new(def: Arc<GameDefinition>) -> Self {
        let nres = def.nres();
        let levels = def
            .upgrades
            .iter()
            .map(|u| usize::from(u.is_free()))
            .collect();
        let mut state = Self {
            levels,
            modes: vec![ProductionMode::Primary; def.len()],
            amounts: vec![0.0; nres],
            rates: vec![0.0; nres],
            point_rate: 0.0,
            external_bonus: vec![0.0; nres],
            time: 0.0,
            points: 0.0,
            def,
        };
        state.update_rates();
        state
    }

    #[must_use]
    pub fn definition(&self) -> &Arc<GameDefinition> {
        &self.def
    }

    #[must_use]
    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    #[must_use]
    pub fn level(&self, upgrade: usize) -> usize {
        self.levels.get(upgrade).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn mode(&self, upgrade: usize) -> ProductionMode {
        self.modes.get(upgrade).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn amounts(&self) -> &[f64] {
        &self.amounts
    }

    #[must_use]
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    #[must_use]
    pub const fn point_rate(&self) -> f64 {
        self.point_rate
    }

    #[must_use]
    pub const fn points(&self) -> f64 {
        self.points
    }

    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    #[must_use]
    pub fn time_left(&self) -> f64 {
        (self.def.event_secs - self.time).max(0.0)
    }

    #[must_use]
    pub fn external_bonus(&self) -> &[f64] {
        &self.external_bonus
    }

    #[must_use]
    pub fn is_max_level(&self, upgrade: usize) -> bool {
        self.def
            .upgrades
            .get(upgrade)
            .is_none_or(|u| self.level(upgrade) >= u.max_level())
    }

    /// Overwrite one resource amount.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownResource` when `resource` is out of range.
    pub fn set_amount(&mut self, resource: usize, amount: f64) -> Result<(), GameError> {
        let slot = self
            .amounts
            .get_mut(resource)
            .ok_or_else(|| GameError::UnknownResource(format!("#{resource}")))?;
        *slot = amount;
        Ok(())
    }

    pub const fn set_points(&mut self, points: f64) {
        self.points = points;
    }

    /// Move the clock to `time`, clamped to the event horizon. Nothing accrues.
    pub fn set_time(&mut self, time: f64) {
        self.time = time.clamp(0.0, self.def.event_secs);
    }

    /// Force an upgrade level without paying for it.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownUpgrade` or `GameError::MaxLevel` when the
    /// level does not exist.
    pub fn set_level(&mut self, upgrade: usize, level: usize) -> Result<(), GameError> {
        let def = Arc::clone(&self.def);
        let up = def.upgrade(upgrade)?;
        if level > up.max_level() {
            return Err(GameError::MaxLevel {
                name: up.name().to_string(),
                max: up.max_level(),
            });
        }
        self.levels[upgrade] = level;
        self.update_rates();
        Ok(())
    }

    /// Persistent additive bonus for every resource, e.g. from purchased gems.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Definition` when the width does not match.
    pub fn set_external_bonus(&mut self, bonus: Vec<f64>) -> Result<(), GameError> {
        if bonus.len() != self.def.nres() {
            return Err(GameError::Definition(format!(
                "external bonus has {} entries, expected {}",
                bonus.len(),
                self.def.nres()
            )));
        }
        self.external_bonus = bonus;
        self.update_rates();
        Ok(())
    }

    /// Recompute the resource and point rates from the current levels.
    pub fn update_rates(&mut self) {
        let mut mods = RateModifiers::new(&self.external_bonus);
        for (upgrade, &level) in self.def.upgrades.iter().zip(&self.levels) {
            if let Upgrade::Boost(boost) = upgrade {
                boost.apply_modifiers(level, &mut mods);
            }
        }
        self.rates.iter_mut().for_each(|r| *r = 0.0);
        let mut point_rate = 0.0;
        for ((upgrade, &level), &mode) in self.def.upgrades.iter().zip(&self.levels).zip(&self.modes) {
            if let Upgrade::Producer(producer) = upgrade {
                point_rate += producer.apply_to_rates(level, mode, &mods.bonuses, &mut self.rates);
            }
        }
        let time_factor = mods.time_factor + self.def.time_modifier;
        self.point_rate = point_rate * mods.point_multiplier / time_factor;
        for rate in &mut self.rates {
            *rate /= time_factor;
        }
    }

    /// Let `dt` seconds pass at the current rates, stopping at the horizon.
    pub fn advance_time(&mut self, dt: f64) {
        let dt = dt.min(self.time_left()).max(0.0);
        self.time += dt;
        self.points += dt * self.point_rate;
        for (amount, rate) in self.amounts.iter_mut().zip(&self.rates) {
            *amount += dt * rate;
        }
    }

    /// Run out whatever time is left in the event.
    pub fn finish(&mut self) {
        self.advance_time(self.time_left());
    }

    /// Seconds until the next level of `upgrade` is affordable.
    ///
    /// `Ok(None)` means never: the upgrade is maxed, its producer link is not
    /// purchased, a missing resource is not being produced, or the wait runs
    /// past the horizon.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownUpgrade` when `upgrade` is out of range.
    pub fn time_till_level_up(&self, upgrade: usize) -> Result<Option<f64>, GameError> {
        let up = self.def.upgrade(upgrade)?;
        let Some(cost) = up.level_cost(self.levels[upgrade] + 1) else {
            return Ok(None);
        };
        if let Upgrade::Producer(p) = up
            && let Some(needs) = p.needs
            && self.level(needs) == 0
        {
            return Ok(None);
        }
        if cost.iter().zip(&self.amounts).all(|(c, a)| c <= a) {
            return Ok(Some(0.0));
        }
        let mut wait: f64 = 0.0;
        for ((&c, &amount), &rate) in cost.iter().zip(&self.amounts).zip(&self.rates) {
            let short = (c - amount).ceil();
            if short <= 0.0 {
                continue;
            }
            if rate <= 0.0 {
                return Ok(None);
            }
            wait = wait.max(short / rate);
        }
        if wait > self.def.event_secs - self.time {
            return Ok(None);
        }
        Ok(Some(wait + self.def.overshoot_secs))
    }

    /// Pay for and apply the next level of `upgrade`.
    ///
    /// The cost is deducted even when it exceeds the resources on hand.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownUpgrade` or `GameError::MaxLevel`.
    pub fn level_up(&mut self, upgrade: usize) -> Result<(), GameError> {
        let def = Arc::clone(&self.def);
        let up = def.upgrade(upgrade)?;
        let next = self.levels[upgrade] + 1;
        let cost = up.level_cost(next).ok_or_else(|| GameError::MaxLevel {
            name: up.name().to_string(),
            max: up.max_level(),
        })?;
        for (amount, c) in self.amounts.iter_mut().zip(cost) {
            *amount -= c;
        }
        if self.amounts.iter().any(|&a| a < 0.0) {
            log::debug!(
                "{} level {next} leaves a negative balance: {:?}",
                up.name(),
                self.amounts
            );
        }
        self.levels[upgrade] = next;
        self.update_rates();
        Ok(())
    }

    /// Rate change, in percent, that one more level of `upgrade` would bring.
    ///
    /// A zero baseline yields an infinite or NaN entry.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownUpgrade` or `GameError::MaxLevel`.
    pub fn pcnt_boost(&self, upgrade: usize) -> Result<RateBoost, GameError> {
        let up = self.def.upgrade(upgrade)?;
        if self.is_max_level(upgrade) {
            return Err(GameError::MaxLevel {
                name: up.name().to_string(),
                max: up.max_level(),
            });
        }
        let mut boosted = self.clone();
        boosted.levels[upgrade] += 1;
        boosted.update_rates();
        let pct = |after: f64, before: f64| (after / before - 1.0) * 100.0;
        Ok(RateBoost {
            resources: boosted
                .rates
                .iter()
                .zip(&self.rates)
                .map(|(&after, &before)| pct(after, before))
                .collect(),
            points: pct(boosted.point_rate, self.point_rate),
        })
    }

    /// Seconds from now until `second` is affordable, if `first` is bought
    /// after waiting `after` seconds. Unreachable yields
    /// [`UNREACHABLE_DELAY_SECS`].
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownUpgrade` or `GameError::MaxLevel` for `first`.
    pub fn upg_time_after_upg(
        &self,
        first: usize,
        after: f64,
        second: usize,
    ) -> Result<f64, GameError> {
        let mut branch = self.clone();
        branch.advance_time(after);
        branch.level_up(first)?;
        Ok(branch
            .time_till_level_up(second)?
            .map_or(UNREACHABLE_DELAY_SECS, |t| t + after))
    }

    /// Select the primary or alternate production profile of a producer.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownUpgrade`, or `GameError::NotSwitchable` for
    /// boosts and producers without an alternate profile.
    pub fn change_prod(&mut self, upgrade: usize, mode: ProductionMode) -> Result<(), GameError> {
        let up = self.def.upgrade(upgrade)?;
        if !up.as_producer().is_some_and(|p| p.is_switchable()) {
            return Err(GameError::NotSwitchable {
                name: up.name().to_string(),
            });
        }
        self.modes[upgrade] = mode;
        self.update_rates();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_OVERSHOOT_SECS;
    use crate::fixtures::{market, producer, profile, single_producer};
    use crate::upgrade::Upgrade;

    #[test]
    fn single_producer_rates_and_accrual() {
        let mut state = GameState::new(single_producer());
        assert_eq!(state.levels(), &[1]);
        assert_eq!(state.rates()[0], 10.0 / 60.0);
        assert!((state.rates()[0] - 0.1667).abs() < 1e-4);
        state.advance_time(600.0);
        assert!((state.amounts()[0] - 100.0).abs() < 1e-9);
        assert_eq!(state.time(), 600.0);
    }

    #[test]
    fn update_rates_is_idempotent_and_bit_exact() {
        let mut state = GameState::new(market());
        state.level_up(1).unwrap();
        state.level_up(3).unwrap();
        state.update_rates();
        let first = (state.rates().to_vec(), state.point_rate());
        state.update_rates();
        assert_eq!(first, (state.rates().to_vec(), state.point_rate()));
        // stall (2 + 1) / 10, sawmill upkeep -1 / 20 with no bonus
        assert_eq!(state.rates()[0], 3.0 / 10.0 + -1.0 / 20.0);
        assert_eq!(state.rates()[1], 2.0 / 20.0);
        assert_eq!(state.point_rate(), (1.0 / 10.0 + 1.0 / 20.0) * 1.5);
    }

    #[test]
    fn time_modifier_divides_every_rate() {
        let def = Arc::unwrap_or_clone(single_producer()).with_time_modifier(-0.25);
        let state = GameState::new(Arc::new(def));
        assert_eq!(state.rates()[0], 10.0 / 60.0 / 0.75);
    }

    #[test]
    fn advance_clamps_to_horizon() {
        let def = Arc::unwrap_or_clone(single_producer()).with_event_secs(100.0);
        let mut state = GameState::new(Arc::new(def));
        state.advance_time(60.0);
        state.advance_time(60.0);
        assert_eq!(state.time(), 100.0);
        assert!((state.amounts()[0] - 100.0 / 6.0).abs() < 1e-9);
        state.advance_time(10.0);
        assert_eq!(state.time(), 100.0);
    }

    fn two_resource_game() -> GameState {
        let mine = producer(
            "Mine",
            2.0,
            vec![profile(&[1.0, 0.0], 0.0), profile(&[2.0, 0.0], 0.0)],
            vec![vec![0.0, 0.0], vec![50.0, 0.0]],
        );
        let def = GameDefinition::new("pair", vec!["ore".into(), "gold".into()], vec![Upgrade::Producer(mine)])
            .with_time_modifier(0.0);
        let mut state = GameState::new(Arc::new(def));
        state.set_amount(0, 10.0).unwrap();
        state
    }

    #[test]
    fn time_till_level_up_matches_worked_example() {
        let state = two_resource_game();
        assert_eq!(state.rates()[0], 0.5);
        assert_eq!(
            state.time_till_level_up(0).unwrap(),
            Some(80.0 + DEFAULT_OVERSHOOT_SECS)
        );
    }

    #[test]
    fn zero_rate_shortfall_is_never() {
        let mut state = GameState::new(market());
        state.level_up(1).unwrap();
        state.change_prod(1, ProductionMode::Alternate).unwrap();
        state.set_amount(0, 500.0).unwrap();
        assert_eq!(state.rates()[1], 0.0);
        // workshop needs wood, which the paused sawmill no longer makes
        assert_eq!(state.time_till_level_up(2).unwrap(), None);

        let mut maxed = two_resource_game();
        maxed.amounts = vec![60.0, 0.0];
        maxed.level_up(0).unwrap();
        assert_eq!(maxed.time_till_level_up(0).unwrap(), None);
    }

    #[test]
    fn affordable_is_zero_and_unmet_link_is_never() {
        let mut state = GameState::new(market());
        state.set_amount(0, 1_000.0).unwrap();
        state.set_amount(1, 1_000.0).unwrap();
        assert_eq!(state.time_till_level_up(0).unwrap(), Some(0.0));
        assert_eq!(state.time_till_level_up(2).unwrap(), None);
        state.level_up(1).unwrap();
        assert_eq!(state.time_till_level_up(2).unwrap(), Some(0.0));
    }

    #[test]
    fn estimate_past_horizon_is_never() {
        let mut state = two_resource_game();
        state.set_time(state.definition().event_secs - 50.0);
        assert_eq!(state.time_till_level_up(0).unwrap(), None);
    }

    #[test]
    fn more_resources_never_wait_longer() {
        let mut state = GameState::new(market());
        state.level_up(1).unwrap();
        let mut last = f64::INFINITY;
        for coins in [0.0, 10.0, 25.0, 49.0, 50.0, 80.0] {
            state.set_amount(0, coins).unwrap();
            state.set_amount(1, 5.0).unwrap();
            let wait = state.time_till_level_up(2).unwrap().unwrap_or(f64::INFINITY);
            assert!(wait <= last, "{coins} coins waited {wait}, more than {last}");
            last = wait;
        }
    }

    #[test]
    fn level_up_errors_at_max_and_allows_debt() {
        let mut state = GameState::new(single_producer());
        assert!(matches!(state.level_up(0), Err(GameError::MaxLevel { max: 1, .. })));
        assert!(matches!(state.level_up(5), Err(GameError::UnknownUpgrade { .. })));

        let mut market = GameState::new(market());
        market.level_up(2).unwrap();
        assert_eq!(market.amounts(), &[-50.0, -20.0]);
        assert_eq!(market.level(2), 1);
    }

    #[test]
    fn pcnt_boost_leaves_state_untouched() {
        let mut state = GameState::new(market());
        state.level_up(1).unwrap();
        let before = (state.rates().to_vec(), state.point_rate(), state.levels().to_vec());
        let boost = state.pcnt_boost(0).unwrap();
        assert_eq!(before, (state.rates().to_vec(), state.point_rate(), state.levels().to_vec()));
        // stall level 2 doubles its coin output: 0.4 - 0.05 vs 0.2 - 0.05
        assert!((boost.resources[0] - (0.35 / 0.15 - 1.0) * 100.0).abs() < 1e-9);
        assert_eq!(boost.resources[1], 0.0);
        assert!(boost.points > 0.0);
    }

    #[test]
    fn upg_time_after_upg_reports_delay_or_sentinel() {
        let state = GameState::new(market());
        // buying the sawmill first only delays the second stall level
        let plain = state.time_till_level_up(0).unwrap().unwrap();
        let after = state.upg_time_after_upg(1, 200.0, 0).unwrap();
        assert!(after > plain);
        // the workshop stays unreachable after a stall level
        let never = state.upg_time_after_upg(0, 200.0, 2).unwrap();
        assert_eq!(never, UNREACHABLE_DELAY_SECS);
        assert_eq!(state.time(), 0.0);
    }

    #[test]
    fn change_prod_switches_profiles() {
        let mut state = GameState::new(market());
        state.level_up(1).unwrap();
        let running = state.rates()[1];
        state.change_prod(1, ProductionMode::Alternate).unwrap();
        assert_eq!(state.rates()[1], 0.0);
        assert_eq!(state.rates()[0], 2.0 / 10.0);
        state.change_prod(1, ProductionMode::Primary).unwrap();
        assert_eq!(state.rates()[1], running);
        assert!(matches!(
            state.change_prod(0, ProductionMode::Alternate),
            Err(GameError::NotSwitchable { .. })
        ));
    }

    #[test]
    fn clones_share_the_definition() {
        let state = GameState::new(market());
        let mut branch = state.clone();
        branch.advance_time(100.0);
        branch.level_up(1).unwrap();
        assert!(Arc::ptr_eq(state.definition(), branch.definition()));
        assert_eq!(state.level(1), 0);
        assert_eq!(state.time(), 0.0);
    }

    #[test]
    fn finish_runs_to_horizon() {
        let mut state = GameState::new(single_producer());
        state.finish();
        assert_eq!(state.time_left(), 0.0);
    }
}
