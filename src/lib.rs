//! DS1307 / DS3231 / DS3232 real time clock platform agnostic driver
//!
//! # About
//!
//!The DS1307 serial real-time clock is a low-power, full binary-coded decimal (BCD) clock/calendar plus 56 bytes of
//!NV SRAM. The DS3231 and DS3232 are extremely accurate I2C RTCs with an integrated temperature-compensated crystal
//!oscillator, two time-of-day alarms, a programmable square-wave output and a digital temperature sensor. The DS3232
//!adds 236 bytes of battery-backed SRAM. All of them share the bus address and the layout of the seven timekeeping
//!registers. The chip driver is based on [`embedded-hal`] traits.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//!
//!Datasheets: [DS1307](https://datasheets.maximintegrated.com/en/ds/DS1307.pdf),
//![DS3231](https://datasheets.maximintegrated.com/en/ds/DS3231.pdf),
//![DS3232](https://datasheets.maximintegrated.com/en/ds/DS3232.pdf)
//!
//! ## Driver features:
//! - Reading/setting date and time as calendar fields, Unix timestamp or `chrono` types
//! - Clock halt handling so the clock never runs on a partially written value
//! - 12-hour (AM/PM) or 24-hour format
//! - Square-wave output
//! - Alarms, alarm interrupts and flags (DS3231/DS3232)
//! - Temperature sensor and oscillator stop flag (DS3231/DS3232)
//! - Battery-backed general-purpose RAM (DS1307/DS3232)
//!
//! ```no_run
//! # use embedded_hal_mock::i2c::Mock;
//! # let i2c = Mock::new(&[]);
//! use gfrtc::{Model, Rtc};
//!
//! let mut rtc = Rtc::new(i2c, Model::Ds3231);
//! if rtc.begin() {
//!     rtc.set(1_600_000_000).ok();
//!     let now = rtc.get();
//! }
//! ```

#![cfg_attr(not(test), no_std)]

use core::convert::TryFrom;
use embedded_hal as hal;
use hal::blocking::i2c;
use log::{debug, warn};

pub use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
pub use datetime::DateTime;
pub use registers::{Alarm, Alarm1Rate, Alarm2Rate, AlarmTime, SquareWave};
use registers::{AlarmMask, BitFlags, Ds1307Register, Register, DS3232_SRAM};
pub use rtcc::DateTimeAccess;

mod datetime;
mod registers;

/// 7-bit bus address shared by every chip of the family
pub const ADDRESS: u8 = 0x68;

/// Largest number of data bytes moved in a single bus transaction
pub const MAX_TRANSFER: usize = 32;

/// RTC error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcError {
    /// Argument out of range: transfer too long, RAM out of bounds or a date the chip cannot hold
    Parameter,
    /// The bus transaction failed
    I2c,
    /// The time was read but the oscillator is halted
    ClockHalted,
    /// The selected chip does not have this feature
    Unsupported,
}

/// Chip variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Ds1307,
    Ds3231,
    Ds3232,
}

impl Model {
    /// Start register and size of the general-purpose RAM
    fn nvram(&self) -> Option<(u8, usize)> {
        match self {
            Model::Ds1307 => Some((Ds1307Register::RAM.addr(), 56)),
            Model::Ds3231 => None,
            Model::Ds3232 => Some((DS3232_SRAM, 236)),
        }
    }

    /// Number of battery-backed RAM bytes
    pub fn nvram_size(&self) -> usize {
        self.nvram().map_or(0, |(_, size)| size)
    }
}

///Hour format: 12-hour (AM/PM) or 24-hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourMode {
    Hour24,
    Hour12,
}

///Hour information: 12-hour (AM/PM) or 24-hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hours {
    Hour24(u8),
    Hour12am(u8),
    Hour12pm(u8),
}

impl Hours {
    fn convert(&self) -> Self {
        match *self {
            Hours::Hour24(0) => Hours::Hour12am(12),
            Hours::Hour24(12) => Hours::Hour12pm(12),
            Hours::Hour24(h) if h > 12 => Hours::Hour12pm(h - 12),
            Hours::Hour24(h) => Hours::Hour12am(h),
            Hours::Hour12am(_) | Hours::Hour12pm(_) => Hours::Hour24(self.to_24()),
        }
    }

    /// Get the hour.
    /// return.1: None => Hour24 mode; Some(false) => am; Some(true) => pm;
    pub fn hour(&self) -> (u8, Option<bool>) {
        match *self {
            Hours::Hour24(h) => (h, None),
            Hours::Hour12am(h) => (h, Some(false)),
            Hours::Hour12pm(h) => (h, Some(true)),
        }
    }

    /// The hour in 24-hour format, 0 to 23
    pub fn to_24(&self) -> u8 {
        match *self {
            Hours::Hour24(h) => h,
            Hours::Hour12am(12) => 0,
            Hours::Hour12am(h) => h,
            Hours::Hour12pm(12) => 12,
            Hours::Hour12pm(h) => h.wrapping_add(12),
        }
    }

    pub fn mode(&self) -> HourMode {
        match self {
            Hours::Hour24(_) => HourMode::Hour24,
            _ => HourMode::Hour12,
        }
    }
}

impl From<u8> for Hours {
    fn from(byte: u8) -> Self {
        if (byte & BitFlags::HOUR_12) != 0 {
            let hour = bcd_to_decimal(byte & 0x1F);
            if (byte & BitFlags::HOUR_PM) != 0 {
                Hours::Hour12pm(hour)
            } else {
                Hours::Hour12am(hour)
            }
        } else {
            Hours::Hour24(bcd_to_decimal(byte & 0x3F))
        }
    }
}

impl From<Hours> for u8 {
    fn from(h: Hours) -> Self {
        match h {
            Hours::Hour24(hour) => decimal_to_bcd(hour),
            Hours::Hour12am(hour) => decimal_to_bcd(hour) | BitFlags::HOUR_12,
            Hours::Hour12pm(hour) => decimal_to_bcd(hour) | BitFlags::HOUR_12 | BitFlags::HOUR_PM,
        }
    }
}

/// Temperature reported by the DS323x sensor, with a resolution of 0.25 °C
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperature(i16);

impl Temperature {
    fn from_registers(msb: u8, lsb: u8) -> Self {
        // 10-bit two's complement, left aligned across MSB:LSB
        Temperature(i16::from_be_bytes([msb, lsb]) >> 6)
    }

    /// Temperature in units of 0.25 °C
    pub fn quarter_degrees(&self) -> i16 {
        self.0
    }

    /// Whole degrees Celsius, fractional part discarded
    pub fn degrees(&self) -> i16 {
        self.0 / 4
    }

    pub fn celsius(&self) -> f32 {
        f32::from(self.0) / 4.0
    }
}

///RTC driver
#[derive(Debug)]
pub struct Rtc<I2C> {
    i2c: I2C,
    model: Model,
    present: bool,
}

impl<I2C> Rtc<I2C> {
    ///Creates new RTC instance. No bus traffic happens until the first operation.
    pub fn new(i2c: I2C, model: Model) -> Self {
        Rtc {
            i2c,
            model,
            present: false,
        }
    }

    ///Delete RTC instance and return the I2C interface
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Whether the last bus transaction completed without error
    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn nvram_size(&self) -> usize {
        self.model.nvram_size()
    }

    fn ds323x(&self) -> Result<(), RtcError> {
        match self.model {
            Model::Ds1307 => Err(RtcError::Unsupported),
            Model::Ds3231 | Model::Ds3232 => Ok(()),
        }
    }
}

impl<I2C, E> Rtc<I2C>
where
    I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E>,
{
    /// Check for the chip on the bus by reading the seconds register
    pub fn begin(&mut self) -> bool {
        self.read_register(Register::SECONDS.addr()).ok();
        self.present
    }

    /// Read `buf.len()` consecutive registers starting at `reg` in one transaction.
    /// The length cannot exceed [`MAX_TRANSFER`].
    pub fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), RtcError> {
        let len = buf.len();
        if len > MAX_TRANSFER {
            return Err(RtcError::Parameter);
        }
        let result = self.i2c.write_read(ADDRESS, &[reg], buf);
        self.present = result.is_ok();
        result.map_err(|_| {
            warn!("rtc: reading {} bytes at {:#04x} failed", len, reg);
            RtcError::I2c
        })
    }

    /// Write `data` to consecutive registers starting at `reg` in one transaction.
    /// The length cannot exceed [`MAX_TRANSFER`].
    pub fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<(), RtcError> {
        let len = data.len();
        if len > MAX_TRANSFER {
            return Err(RtcError::Parameter);
        }
        let mut bytes = [0_u8; MAX_TRANSFER + 1];
        bytes[0] = reg;
        bytes[1..=len].copy_from_slice(data);
        let result = self.i2c.write(ADDRESS, &bytes[..=len]);
        self.present = result.is_ok();
        result.map_err(|_| {
            warn!("rtc: writing {} bytes at {:#04x} failed", len, reg);
            RtcError::I2c
        })
    }

    pub fn read_register(&mut self, reg: u8) -> Result<u8, RtcError> {
        let mut byte = [0_u8];
        self.read_registers(reg, &mut byte)?;
        Ok(byte[0])
    }

    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), RtcError> {
        self.write_registers(reg, &[value])
    }

    ///Return current date and time.
    ///Fails with [`RtcError::ClockHalted`] when the oscillator is stopped.
    pub fn read(&mut self) -> Result<DateTime, RtcError> {
        let mut bytes = [0_u8; 7];
        self.read_registers(Register::SECONDS.addr(), &mut bytes)?;
        if (bytes[0] & BitFlags::CLOCK_HALT) != 0 {
            return Err(RtcError::ClockHalted);
        }
        Ok(DateTime {
            second: bcd_to_decimal(bytes[0] & !BitFlags::CLOCK_HALT),
            minute: bcd_to_decimal(bytes[1] & 0x7F),
            hour: Hours::from(bytes[2]).to_24(),
            weekday: bcd_to_decimal(bytes[3] & 0x07),
            day: bcd_to_decimal(bytes[4] & 0x3F),
            month: bcd_to_decimal(bytes[5] & !BitFlags::CENTURY),
            year: bcd_to_decimal(bytes[6]),
        })
    }

    ///Set date and time. The hours register is left in 24-hour format.
    ///
    ///The registers are written twice: first with the clock halt bit set, then
    ///with it cleared, so the clock never runs on a partially written value.
    pub fn write(&mut self, dt: &DateTime) -> Result<(), RtcError> {
        let mut bytes = [
            decimal_to_bcd(dt.second),
            decimal_to_bcd(dt.minute),
            Hours::Hour24(dt.hour).into(),
            decimal_to_bcd(dt.weekday),
            decimal_to_bcd(dt.day),
            decimal_to_bcd(dt.month),
            decimal_to_bcd(dt.year),
        ];
        bytes[0] |= BitFlags::CLOCK_HALT;
        self.write_registers(Register::SECONDS.addr(), &bytes)?;
        bytes[0] &= !BitFlags::CLOCK_HALT;
        self.write_registers(Register::SECONDS.addr(), &bytes)?;
        debug!(
            "rtc: clock set to 20{:02}-{:02}-{:02} {:02}:{:02}:{:02}",
            dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
        );
        Ok(())
    }

    ///Return current time as a Unix timestamp
    pub fn get(&mut self) -> Result<i32, RtcError> {
        self.read()?.timestamp()
    }

    ///Set current time from a Unix timestamp, which must not be before 2000
    pub fn set(&mut self, timestamp: i32) -> Result<(), RtcError> {
        let dt = DateTime::from_timestamp(timestamp)?;
        self.write(&dt)
    }

    ///Return current information about hours
    pub fn hours(&mut self) -> Result<Hours, RtcError> {
        self.read_register(Register::HOURS.addr()).map(Hours::from)
    }

    ///Switch between 12-hour (AM/PM) and 24-hour mode
    pub fn set_hour_mode(&mut self, mode: HourMode) -> Result<(), RtcError> {
        let hr = self.hours()?;
        if hr.mode() == mode {
            return Ok(());
        }
        debug!("rtc: switching to {:?}", mode);
        self.write_register(Register::HOURS.addr(), hr.convert().into())
    }

    /// Read general-purpose RAM starting at `address`, relative to the start of the RAM.
    pub fn read_nvram(&mut self, address: u8, buf: &mut [u8]) -> Result<(), RtcError> {
        let reg = self.nvram_register(address, buf.len())?;
        self.read_registers(reg, buf)
    }

    /// Write general-purpose RAM starting at `address`, relative to the start of the RAM.
    pub fn write_nvram(&mut self, address: u8, data: &[u8]) -> Result<(), RtcError> {
        let reg = self.nvram_register(address, data.len())?;
        self.write_registers(reg, data)
    }

    fn nvram_register(&self, address: u8, len: usize) -> Result<u8, RtcError> {
        let (start, size) = self.model.nvram().ok_or(RtcError::Unsupported)?;
        let address = usize::from(address);
        if len > MAX_TRANSFER || address >= size || address + len > size {
            return Err(RtcError::Parameter);
        }
        u8::try_from(usize::from(start) + address).map_err(|_| RtcError::Parameter)
    }

    /// Configure the square-wave output pin.
    pub fn set_square_wave(&mut self, rate: SquareWave) -> Result<(), RtcError> {
        match self.model {
            Model::Ds1307 => {
                let control = rate.ds1307_control().ok_or(RtcError::Unsupported)?;
                self.write_register(Ds1307Register::CONTROL.addr(), control)
            }
            Model::Ds3231 | Model::Ds3232 => {
                if rate == SquareWave::Hz32768 {
                    return Err(RtcError::Unsupported);
                }
                let control = self.read_register(Register::CONTROL.addr())?;
                let control = rate
                    .ds323x_control(control)
                    .ok_or(RtcError::Unsupported)?;
                self.write_register(Register::CONTROL.addr(), control)
            }
        }
    }

    /// Program alarm 1. `time.day` is matched as the date of the month or the
    /// day of the week depending on `rate`.
    pub fn set_alarm1(&mut self, rate: Alarm1Rate, time: &AlarmTime) -> Result<(), RtcError> {
        self.ds323x()?;
        let mask = AlarmMask::from(rate).bits();
        let bytes = [
            decimal_to_bcd(time.second) | mask[0],
            decimal_to_bcd(time.minute) | mask[1],
            decimal_to_bcd(time.hour) | mask[2],
            decimal_to_bcd(time.day) | mask[3],
        ];
        self.write_registers(Register::ALARM1.addr(), &bytes)
    }

    /// Program alarm 2. `time.second` is ignored.
    pub fn set_alarm2(&mut self, rate: Alarm2Rate, time: &AlarmTime) -> Result<(), RtcError> {
        self.ds323x()?;
        let mask = AlarmMask::from(rate).bits();
        let bytes = [
            decimal_to_bcd(time.minute) | mask[1],
            decimal_to_bcd(time.hour) | mask[2],
            decimal_to_bcd(time.day) | mask[3],
        ];
        self.write_registers(Register::ALARM2.addr(), &bytes)
    }

    /// Enable or disable the interrupt output of an alarm. The INT/SQW pin
    /// only carries alarm interrupts while the square wave is [`SquareWave::Off`].
    pub fn set_alarm_interrupt(&mut self, alarm: Alarm, enable: bool) -> Result<(), RtcError> {
        self.ds323x()?;
        let control = self.read_register(Register::CONTROL.addr())?;
        let mask = alarm.interrupt_enable();
        let control = if enable {
            control | mask
        } else {
            control & !mask
        };
        self.write_register(Register::CONTROL.addr(), control)
    }

    /// Whether the alarm has fired. A set flag is cleared.
    pub fn alarm_triggered(&mut self, alarm: Alarm) -> Result<bool, RtcError> {
        self.ds323x()?;
        let status = self.read_register(Register::STATUS.addr())?;
        let flag = alarm.flag();
        if (status & flag) == 0 {
            return Ok(false);
        }
        self.write_register(Register::STATUS.addr(), status & !flag)?;
        Ok(true)
    }

    /// Whether the oscillator stopped at some point, meaning the time may be invalid.
    /// With `clear` the flag is reset once read as set.
    pub fn oscillator_stopped(&mut self, clear: bool) -> Result<bool, RtcError> {
        self.ds323x()?;
        let status = self.read_register(Register::STATUS.addr())?;
        let stopped = (status & BitFlags::OSF) != 0;
        if stopped && clear {
            self.write_register(Register::STATUS.addr(), status & !BitFlags::OSF)?;
        }
        Ok(stopped)
    }

    /// Last temperature measured by the chip
    pub fn temperature(&mut self) -> Result<Temperature, RtcError> {
        self.ds323x()?;
        let mut bytes = [0_u8; 2];
        self.read_registers(Register::TEMP_MSB.addr(), &mut bytes)?;
        Ok(Temperature::from_registers(bytes[0], bytes[1]))
    }

    /// Force a temperature conversion.
    /// Returns `nb::Error::WouldBlock` while the chip is busy with its own conversion.
    pub fn start_temperature_conversion(&mut self) -> nb::Result<(), RtcError> {
        self.ds323x()?;
        let status = self.read_register(Register::STATUS.addr())?;
        if (status & BitFlags::BSY) != 0 {
            return Err(nb::Error::WouldBlock);
        }
        let control = self.read_register(Register::CONTROL.addr())?;
        self.write_register(Register::CONTROL.addr(), control | BitFlags::CONV)?;
        Ok(())
    }

    /// Temperature of a forced conversion.
    /// Returns `nb::Error::WouldBlock` until the conversion is complete.
    pub fn converted_temperature(&mut self) -> nb::Result<Temperature, RtcError> {
        self.ds323x()?;
        let control = self.read_register(Register::CONTROL.addr())?;
        if (control & BitFlags::CONV) != 0 {
            return Err(nb::Error::WouldBlock);
        }
        Ok(self.temperature()?)
    }
}

impl<I2C, E> DateTimeAccess for Rtc<I2C>
where
    I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E>,
{
    type Error = RtcError;

    fn datetime(&mut self) -> Result<NaiveDateTime, Self::Error> {
        self.read()?.to_naive()
    }

    fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), Self::Error> {
        let dt = DateTime::try_from(datetime)?;
        self.write(&dt)
    }
}

/// Swap format from bcd to decimal.
/// Only meaningful for bytes holding two BCD digits.
pub fn bcd_to_decimal(bcd: u8) -> u8 {
    ((bcd & 0xF0) >> 4) * 10 + (bcd & 0x0F)
}

/// Swap format from decimal to bcd.
/// Only meaningful for values 0 to 99.
pub fn decimal_to_bcd(decimal: u8) -> u8 {
    ((decimal / 10) << 4) + (decimal % 10)
}
