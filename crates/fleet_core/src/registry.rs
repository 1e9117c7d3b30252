//! Authoritative in-memory table of fleet units.
//!
//! The set of units is fixed when the registry is built; only their state changes.
//! Each unit sits behind its own lock, so writes to different units never contend.
//! [UnitRegistry::update] runs read-current, compute-next, write-next under one write
//! guard, which is what every writer uses to avoid lost updates.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::UnitSeed;
use crate::error::{FleetError, FleetResult};
use crate::fleet::{Unit, UnitId, UnitStatus};

#[derive(Debug)]
pub struct UnitRegistry {
    order: Vec<UnitId>,
    slots: HashMap<UnitId, RwLock<Unit>>,
}

impl UnitRegistry {
    /// Builds the registry from a roster; ids are `amb-1..=amb-N` in roster order.
    pub fn from_roster(roster: &[UnitSeed]) -> Self {
        let units = roster.iter().enumerate().map(|(index, seed)| {
            Unit::new(
                UnitId(index as u32 + 1),
                seed.operator_name.clone(),
                seed.location,
            )
        });
        Self::from_units(units)
    }

    /// Builds the registry from explicit units. A repeated id keeps the first unit.
    pub fn from_units(units: impl IntoIterator<Item = Unit>) -> Self {
        let mut order = Vec::new();
        let mut slots = HashMap::new();
        for unit in units {
            if slots.contains_key(&unit.id) {
                continue;
            }
            order.push(unit.id);
            slots.insert(unit.id, RwLock::new(unit));
        }
        Self { order, slots }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Unit ids in registry iteration order.
    pub fn ids(&self) -> &[UnitId] {
        &self.order
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn get(&self, id: UnitId) -> Option<Unit> {
        self.slots.get(&id).map(|slot| read(slot).clone())
    }

    /// Current status under a read lock, without cloning the unit.
    pub fn status(&self, id: UnitId) -> Option<UnitStatus> {
        self.slots.get(&id).map(|slot| read(slot).status)
    }

    #[cfg(test)]
    pub(crate) fn read_guard(&self, id: UnitId) -> Option<RwLockReadGuard<'_, Unit>> {
        self.slots.get(&id).map(read)
    }

    /// Copies of every unit in registry order.
    pub fn list(&self) -> Vec<Unit> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(id))
            .map(|slot| read(slot).clone())
            .collect()
    }

    /// Swaps in a whole new state for one unit.
    pub fn replace(&self, id: UnitId, unit: Unit) -> FleetResult<()> {
        if unit.id != id {
            return Err(FleetError::NotFound(unit.id));
        }
        let slot = self.slots.get(&id).ok_or(FleetError::NotFound(id))?;
        *write(slot) = unit;
        Ok(())
    }

    /// Computes the next state from the current one and stores it atomically.
    ///
    /// When `next` fails the stored unit is left untouched and the error is returned.
    pub fn update<F>(&self, id: UnitId, next: F) -> FleetResult<Unit>
    where
        F: FnOnce(&Unit) -> FleetResult<Unit>,
    {
        let slot = self.slots.get(&id).ok_or(FleetError::NotFound(id))?;
        let mut guard = write(slot);
        let updated = next(&*guard)?;
        *guard = updated.clone();
        Ok(updated)
    }

    /// First unit (registry order) matching `predicate`.
    pub fn find<P>(&self, mut predicate: P) -> Option<Unit>
    where
        P: FnMut(&Unit) -> bool,
    {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(id))
            .map(read)
            .find(|unit| predicate(&**unit))
            .map(|unit| Unit::clone(&unit))
    }
}

// A writer that panicked mid-update never stored a partial unit, so the value is usable.
fn read(slot: &RwLock<Unit>) -> RwLockReadGuard<'_, Unit> {
    slot.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(slot: &RwLock<Unit>) -> RwLockWriteGuard<'_, Unit> {
    slot.write().unwrap_or_else(PoisonError::into_inner)
}
