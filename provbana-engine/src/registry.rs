//! Validator registration as seen by the scheduler.

use std::sync::Arc;

use provbana_core::network::{Network, ValidatorId};
use tracing::debug;

use crate::error::RegistryError;

/// Registers and unregisters validators with the running network. Calls are
/// issued from event actions only, one at a time.
pub trait ValidatorRegistry: Send + Sync {
    fn register_new_validator(&self) -> Result<ValidatorId, RegistryError>;

    fn unregister_validator(&self, id: ValidatorId) -> Result<(), RegistryError>;
}

/// Registry issuing the registration calls through a random RPC endpoint of
/// the network.
#[derive(Clone)]
pub struct NetBasedValidatorRegistry {
    net: Arc<dyn Network>,
}

impl NetBasedValidatorRegistry {
    pub fn new(net: Arc<dyn Network>) -> Self {
        Self { net }
    }
}

impl ValidatorRegistry for NetBasedValidatorRegistry {
    fn register_new_validator(&self) -> Result<ValidatorId, RegistryError> {
        let client = self.net.dial_random_rpc().map_err(RegistryError::Connect)?;
        let id = client
            .register_validator()
            .map_err(RegistryError::Register)?;
        debug!(validator_id = id, "registered validator");
        Ok(id)
    }

    fn unregister_validator(&self, id: ValidatorId) -> Result<(), RegistryError> {
        let client = self.net.dial_random_rpc().map_err(RegistryError::Connect)?;
        client
            .unregister_validator(id)
            .map_err(RegistryError::Unregister)?;
        debug!(validator_id = id, "unregistered validator");
        Ok(())
    }
}
