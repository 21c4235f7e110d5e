//! A register-level device driver talking through the retrying wrapper
//! to a mock slave that wedges the bus.

use boardhal::config::I2cConfig;
use boardhal::drivers::i2c::RetryingI2c;
use boardhal::error::{Error, I2cError};
use embedded_hal::i2c::I2c;

use crate::mock_hw::{MockI2c, MockRecovery};

const ADDR: u8 = 0x1D;
const WHO_AM_I: u8 = 0x0D;
const CTRL_REG1: u8 = 0x2A;

/// Minimal accelerometer driver, generic over any `I2c` like a real
/// device crate would be.
struct Accel<I> {
    i2c: I,
}

impl<I: I2c> Accel<I> {
    fn who_am_i(&mut self) -> Result<u8, I::Error> {
        let mut id = [0u8; 1];
        self.i2c.write_read(ADDR, &[WHO_AM_I], &mut id)?;
        Ok(id[0])
    }

    fn set_active(&mut self) -> Result<(), I::Error> {
        self.i2c.write(ADDR, &[CTRL_REG1, 0x01])
    }
}

fn setup(max_retries: u8) -> (Accel<RetryingI2c<MockI2c, MockRecovery>>, MockI2c, MockRecovery) {
    let slave = MockI2c::new(ADDR);
    slave.registers.borrow_mut().insert(WHO_AM_I, 0x5A);
    let recovery = MockRecovery::default();
    let config = I2cConfig { max_retries, ..I2cConfig::default() };
    let i2c = RetryingI2c::new(slave.clone(), recovery.clone(), &config);
    (Accel { i2c }, slave, recovery)
}

#[test]
fn device_driver_works_through_wrapper() {
    let (mut accel, slave, recovery) = setup(9);
    assert_eq!(accel.who_am_i().unwrap(), 0x5A);
    accel.set_active().unwrap();
    assert_eq!(slave.registers.borrow().get(&CTRL_REG1), Some(&0x01));
    assert_eq!(recovery.calls.get(), 0);
}

#[test]
fn wedged_bus_is_recovered_transparently() {
    let (mut accel, slave, recovery) = setup(9);
    slave.stuck_for.set(4);
    assert_eq!(accel.who_am_i().unwrap(), 0x5A);
    assert_eq!(recovery.calls.get(), 4);
    assert_eq!(slave.attempts.get(), 5);
}

#[test]
fn budget_spans_transactions_until_a_success() {
    let (mut accel, slave, recovery) = setup(3);

    slave.stuck_for.set(2);
    assert!(accel.who_am_i().is_ok());
    assert_eq!(accel.i2c.retries_used(), 0);

    slave.stuck_for.set(10);
    assert_eq!(
        accel.who_am_i().unwrap_err(),
        Error::I2c(I2cError::RetriesExhausted)
    );
    // Budget spent: the next failure gives up without recovering.
    let calls = recovery.calls.get();
    assert!(accel.set_active().is_err());
    assert_eq!(recovery.calls.get(), calls);

    slave.stuck_for.set(0);
    accel.set_active().unwrap();
    assert_eq!(accel.i2c.retries_used(), 0);
}

#[test]
fn recovery_failure_surfaces() {
    let (mut accel, slave, recovery) = setup(9);
    recovery.broken.set(true);
    slave.stuck_for.set(1);
    assert_eq!(
        accel.who_am_i().unwrap_err(),
        Error::I2c(I2cError::RecoveryFailed)
    );
}

#[test]
fn wrong_address_exhausts_like_any_failure() {
    let (mut accel, _slave, _recovery) = setup(2);
    let mut buf = [0u8; 1];
    assert!(accel.i2c.read(0x50, &mut buf).is_err());
}
