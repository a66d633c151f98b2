//! Book-keeping of validator ids handed out by a network.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use provbana_core::network::ValidatorId;

use crate::error::TrackerError;

pub const DEFAULT_FIRST_VALIDATOR_ID: ValidatorId = 1;
pub const DEFAULT_LAST_VALIDATOR_ID: ValidatorId = 100;

/// Tracks which ids of a fixed, inclusive range are registered.
#[derive(Debug, Clone)]
pub struct ValidatorIdTracker {
    range: RangeInclusive<ValidatorId>,
    registered: BTreeSet<ValidatorId>,
}

impl Default for ValidatorIdTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_VALIDATOR_ID, DEFAULT_LAST_VALIDATOR_ID)
    }
}

impl ValidatorIdTracker {
    pub fn new(first: ValidatorId, last: ValidatorId) -> Self {
        Self {
            range: first..=last,
            registered: BTreeSet::new(),
        }
    }

    /// Lowest id of the range not registered yet.
    pub fn next_available_id(&self) -> Result<ValidatorId, TrackerError> {
        self.range
            .clone()
            .find(|id| !self.registered.contains(id))
            .ok_or(TrackerError::Exhausted)
    }

    pub fn is_id_available(&self, id: ValidatorId) -> Result<bool, TrackerError> {
        self.in_range(id)?;
        Ok(!self.registered.contains(&id))
    }

    pub fn notify_registered_id(&mut self, id: ValidatorId) -> Result<(), TrackerError> {
        self.in_range(id)?;
        self.registered.insert(id);
        Ok(())
    }

    /// Makes `id` available again.
    pub fn release(&mut self, id: ValidatorId) -> Result<(), TrackerError> {
        self.in_range(id)?;
        self.registered.remove(&id);
        Ok(())
    }

    pub fn registered(&self) -> usize {
        self.registered.len()
    }

    fn in_range(&self, id: ValidatorId) -> Result<(), TrackerError> {
        if self.range.contains(&id) {
            Ok(())
        } else {
            Err(TrackerError::OutOfRange {
                id,
                first: *self.range.start(),
                last: *self.range.end(),
            })
        }
    }
}
