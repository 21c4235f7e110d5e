//! Self-healing I2C controller wrapper.
//!
//! Some on-board sensors occasionally wedge the bus.  [`RetryingI2c`]
//! sits in front of any `embedded_hal::i2c::I2c` controller: when a
//! transaction fails it runs the board's [`BusRecovery`] hook (power-cycle
//! the peripheral, clock out a stuck slave) and tries again.
//!
//! The retry budget is shared across transactions and only refilled by a
//! success, so a permanently dead bus stops costing recovery cycles after
//! the first exhausted transaction.

use embedded_hal::i2c::{Error as _, ErrorType, I2c, Operation, SevenBitAddress};
use log::{error, warn};

use crate::config::I2cConfig;
use crate::error::{Error, I2cError};
use crate::ports::BusRecovery;

/// Recovery hook that does nothing; retries are plain repeats.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecovery;

impl BusRecovery for NoRecovery {
    fn recover(&mut self) -> Result<(), I2cError> {
        Ok(())
    }
}

pub struct RetryingI2c<I, R = NoRecovery> {
    i2c: I,
    recovery: R,
    max_retries: u8,
    retries: u8,
}

impl<I: I2c, R: BusRecovery> RetryingI2c<I, R> {
    pub fn new(i2c: I, recovery: R, config: &I2cConfig) -> Self {
        Self {
            i2c,
            recovery,
            max_retries: config.max_retries,
            retries: 0,
        }
    }

    /// Retries spent since the last successful transaction.
    pub fn retries_used(&self) -> u8 {
        self.retries
    }

    pub fn into_inner(self) -> (I, R) {
        (self.i2c, self.recovery)
    }
}

impl<I: I2c, R> ErrorType for RetryingI2c<I, R> {
    type Error = Error;
}

impl<I: I2c, R: BusRecovery> I2c<SevenBitAddress> for RetryingI2c<I, R> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut result = self.i2c.transaction(address, operations);

        while let Err(e) = &result {
            if self.retries >= self.max_retries {
                break;
            }
            warn!(
                "I2C 0x{:02x}: {:?}, recovering (retry {}/{})",
                address,
                e.kind(),
                self.retries + 1,
                self.max_retries
            );
            self.recovery.recover().inspect_err(|e| {
                error!("I2C: bus recovery failed: {}", e);
            })?;
            self.retries += 1;
            result = self.i2c.transaction(address, operations);
        }

        match result {
            Ok(()) => {
                self.retries = 0;
                Ok(())
            }
            Err(e) => {
                error!("I2C 0x{:02x}: giving up ({:?})", address, e.kind());
                Err(I2cError::RetriesExhausted.into())
            }
        }
    }
}
