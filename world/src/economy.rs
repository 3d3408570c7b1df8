//! Session-wide counters: lives, currency and the collected-pickup display.

use lane_defence_core::{PickupId, PlacementError};

/// Mutable counters bounded by a single game session.
#[derive(Debug)]
pub(crate) struct Economy {
    lives: u32,
    currency: u32,
    display: Vec<PickupId>,
    display_cap: usize,
}

impl Economy {
    pub(crate) fn new(lives: u32, display_cap: usize) -> Self {
        Self {
            lives,
            currency: 0,
            display: Vec::with_capacity(display_cap),
            display_cap,
        }
    }

    pub(crate) const fn lives(&self) -> u32 {
        self.lives
    }

    pub(crate) const fn currency(&self) -> u32 {
        self.currency
    }

    pub(crate) fn display(&self) -> &[PickupId] {
        &self.display
    }

    /// Removes one life, never dropping below zero, and returns what is left.
    pub(crate) fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    /// Credits one unit of currency, returning the display slot the pickup
    /// took if the display list still had room.
    pub(crate) fn collect(&mut self, pickup: PickupId) -> Option<usize> {
        self.currency = self.currency.saturating_add(1);
        if self.display.len() >= self.display_cap {
            return None;
        }
        self.display.push(pickup);
        Some(self.display.len() - 1)
    }

    pub(crate) fn ensure_affordable(&self, cost: u32) -> Result<(), PlacementError> {
        if cost > self.currency {
            return Err(PlacementError::InsufficientCurrency {
                cost,
                available: self.currency,
            });
        }
        Ok(())
    }

    /// Deducts `cost`, which the caller has already checked is affordable.
    pub(crate) fn spend(&mut self, cost: u32) -> u32 {
        self.currency = self.currency.saturating_sub(cost);
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lives_floor_at_zero() {
        let mut economy = Economy::new(1, 3);
        assert_eq!(economy.lose_life(), 0);
        assert_eq!(economy.lose_life(), 0);
        assert_eq!(economy.lives(), 0);
    }

    #[test]
    fn display_list_is_capped_but_currency_is_not() {
        let mut economy = Economy::new(3, 3);
        let slots: Vec<Option<usize>> = (0..5).map(|id| economy.collect(PickupId::new(id))).collect();

        assert_eq!(slots, vec![Some(0), Some(1), Some(2), None, None]);
        assert_eq!(economy.currency(), 5);
        assert_eq!(economy.display().len(), 3);
    }

    #[test]
    fn spending_requires_enough_currency() {
        let mut economy = Economy::new(3, 3);
        assert_eq!(
            economy.ensure_affordable(1),
            Err(PlacementError::InsufficientCurrency {
                cost: 1,
                available: 0,
            }),
        );

        let _ = economy.collect(PickupId::new(0));
        let _ = economy.collect(PickupId::new(1));
        assert_eq!(economy.ensure_affordable(2), Ok(()));
        assert_eq!(economy.spend(2), 0);
    }
}
