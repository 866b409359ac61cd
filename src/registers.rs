use fugit::HertzU32;

/// Register definitions shared by the whole family, plus the DS323x extras
#[allow(non_camel_case_types, dead_code)]
pub enum Register {
    SECONDS = 0x00,
    MINUTES = 0x01,
    HOURS = 0x02,
    DAY = 0x03,
    DATE = 0x04,
    MONTH = 0x05,
    YEAR = 0x06,
    ALARM1 = 0x07,
    ALARM2 = 0x0B,
    CONTROL = 0x0E,
    STATUS = 0x0F,
    TEMP_MSB = 0x11,
}

impl Register {
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// DS1307 only registers
pub enum Ds1307Register {
    CONTROL = 0x07,
    RAM = 0x08,
}

impl Ds1307Register {
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// First byte of the DS3232 battery-backed SRAM
pub const DS3232_SRAM: u8 = 0x14;

pub(crate) struct BitFlags;

impl BitFlags {
    // timekeeping
    pub const CLOCK_HALT: u8 = 0x80;
    pub const HOUR_12: u8 = 0x40;
    pub const HOUR_PM: u8 = 0x20;
    pub const CENTURY: u8 = 0x80;

    // DS1307 control
    pub const SQWE: u8 = 0x10;

    // DS323x control
    pub const CONV: u8 = 0x20;
    pub const RS: u8 = 0x18;
    pub const INTCN: u8 = 0x04;
    pub const A2IE: u8 = 0x02;
    pub const A1IE: u8 = 0x01;

    // DS323x status
    pub const OSF: u8 = 0x80;
    pub const BSY: u8 = 0x04;
    pub const A2F: u8 = 0x02;
    pub const A1F: u8 = 0x01;

    // alarm registers
    pub const ALARM_MASK: u8 = 0x80;
    pub const DY_DT: u8 = 0x40;
}

/// Square-wave output rate.
///
/// Not every rate exists on every chip: the DS1307 offers 1 Hz, 4.096 kHz,
/// 8.192 kHz and 32.768 kHz while the DS323x offers 1 Hz, 1.024 kHz,
/// 4.096 kHz and 8.192 kHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareWave {
    /// No square wave. On a DS323x the pin becomes the alarm interrupt output.
    Off,
    Hz1,
    Hz1024,
    Hz4096,
    Hz8192,
    Hz32768,
}

impl SquareWave {
    /// Output frequency, zero when the output is off.
    pub fn frequency(&self) -> HertzU32 {
        HertzU32::from_raw(match self {
            SquareWave::Off => 0,
            SquareWave::Hz1 => 1,
            SquareWave::Hz1024 => 1_024,
            SquareWave::Hz4096 => 4_096,
            SquareWave::Hz8192 => 8_192,
            SquareWave::Hz32768 => 32_768,
        })
    }

    /// Pick the rate matching `frequency` exactly.
    pub fn from_frequency(frequency: HertzU32) -> Option<Self> {
        match frequency.raw() {
            0 => Some(SquareWave::Off),
            1 => Some(SquareWave::Hz1),
            1_024 => Some(SquareWave::Hz1024),
            4_096 => Some(SquareWave::Hz4096),
            8_192 => Some(SquareWave::Hz8192),
            32_768 => Some(SquareWave::Hz32768),
            _ => None,
        }
    }

    /// DS1307 control register value, `None` if the rate is not available.
    pub(crate) fn ds1307_control(&self) -> Option<u8> {
        match self {
            SquareWave::Off => Some(0x00),
            SquareWave::Hz1 => Some(BitFlags::SQWE),
            SquareWave::Hz4096 => Some(BitFlags::SQWE | 0x01),
            SquareWave::Hz8192 => Some(BitFlags::SQWE | 0x02),
            SquareWave::Hz32768 => Some(BitFlags::SQWE | 0x03),
            SquareWave::Hz1024 => None,
        }
    }

    /// Apply the rate to a DS323x control register value.
    pub(crate) fn ds323x_control(&self, control: u8) -> Option<u8> {
        let rs = match self {
            SquareWave::Off => return Some(control | BitFlags::INTCN),
            SquareWave::Hz1 => 0x00,
            SquareWave::Hz1024 => 0x08,
            SquareWave::Hz4096 => 0x10,
            SquareWave::Hz8192 => 0x18,
            SquareWave::Hz32768 => return None,
        };
        Some((control & !(BitFlags::RS | BitFlags::INTCN)) | rs)
    }
}

/// DS323x alarm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alarm {
    One,
    Two,
}

impl Alarm {
    pub(crate) fn interrupt_enable(&self) -> u8 {
        match self {
            Alarm::One => BitFlags::A1IE,
            Alarm::Two => BitFlags::A2IE,
        }
    }

    pub(crate) fn flag(&self) -> u8 {
        match self {
            Alarm::One => BitFlags::A1F,
            Alarm::Two => BitFlags::A2F,
        }
    }
}

/// When alarm 1 fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alarm1Rate {
    EverySecond,
    /// Seconds match
    MatchSeconds,
    /// Minutes and seconds match
    MatchMinutes,
    /// Hours, minutes and seconds match
    MatchHours,
    /// Date of the month, hours, minutes and seconds match
    MatchDate,
    /// Day of the week, hours, minutes and seconds match
    MatchDay,
}

/// When alarm 2 fires. Alarm 2 has no seconds register and fires at second 00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alarm2Rate {
    EveryMinute,
    /// Minutes match
    MatchMinutes,
    /// Hours and minutes match
    MatchHours,
    /// Date of the month, hours and minutes match
    MatchDate,
    /// Day of the week, hours and minutes match
    MatchDay,
}

/// Alarm time of day. Fields the alarm rate masks out are ignored.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Date of the month (1-31) or day of the week (1-7), depending on the rate
    pub day: u8,
}

/// Mask bits for the four alarm bytes (seconds, minutes, hours, day/date).
/// The last entry also carries the DY/DT selector.
pub(crate) struct AlarmMask([u8; 4]);

impl AlarmMask {
    const M: u8 = BitFlags::ALARM_MASK;

    pub fn bits(&self) -> [u8; 4] {
        self.0
    }
}

impl From<Alarm1Rate> for AlarmMask {
    fn from(rate: Alarm1Rate) -> Self {
        let m = AlarmMask::M;
        AlarmMask(match rate {
            Alarm1Rate::EverySecond => [m, m, m, m],
            Alarm1Rate::MatchSeconds => [0, m, m, m],
            Alarm1Rate::MatchMinutes => [0, 0, m, m],
            Alarm1Rate::MatchHours => [0, 0, 0, m],
            Alarm1Rate::MatchDate => [0, 0, 0, 0],
            Alarm1Rate::MatchDay => [0, 0, 0, BitFlags::DY_DT],
        })
    }
}

impl From<Alarm2Rate> for AlarmMask {
    fn from(rate: Alarm2Rate) -> Self {
        let m = AlarmMask::M;
        // alarm 2 has no seconds byte, slot 0 is never written
        AlarmMask(match rate {
            Alarm2Rate::EveryMinute => [0, m, m, m],
            Alarm2Rate::MatchMinutes => [0, 0, m, m],
            Alarm2Rate::MatchHours => [0, 0, 0, m],
            Alarm2Rate::MatchDate => [0, 0, 0, 0],
            Alarm2Rate::MatchDay => [0, 0, 0, BitFlags::DY_DT],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ds1307_square_wave_bits() {
        assert_eq!(SquareWave::Off.ds1307_control(), Some(0x00));
        assert_eq!(SquareWave::Hz1.ds1307_control(), Some(0x10));
        assert_eq!(SquareWave::Hz32768.ds1307_control(), Some(0x13));
        assert_eq!(SquareWave::Hz1024.ds1307_control(), None);
    }

    #[test]
    fn ds323x_square_wave_keeps_unrelated_bits() {
        // INTCN set, alarm 1 interrupt enabled, old rate 8.192 kHz
        let control = 0x1D;
        assert_eq!(SquareWave::Hz1024.ds323x_control(control), Some(0x09));
        assert_eq!(SquareWave::Hz1.ds323x_control(control), Some(0x01));
        assert_eq!(SquareWave::Off.ds323x_control(0x00), Some(0x04));
        assert_eq!(SquareWave::Hz32768.ds323x_control(control), None);
    }

    #[test]
    fn frequency_lookup() {
        for rate in [
            SquareWave::Off,
            SquareWave::Hz1,
            SquareWave::Hz1024,
            SquareWave::Hz4096,
            SquareWave::Hz8192,
            SquareWave::Hz32768,
        ] {
            assert_eq!(SquareWave::from_frequency(rate.frequency()), Some(rate));
        }
        assert_eq!(SquareWave::from_frequency(HertzU32::from_raw(50)), None);
    }

    #[test]
    fn alarm_masks() {
        assert_eq!(
            AlarmMask::from(Alarm1Rate::MatchSeconds).bits(),
            [0x00, 0x80, 0x80, 0x80]
        );
        assert_eq!(
            AlarmMask::from(Alarm1Rate::MatchDay).bits(),
            [0x00, 0x00, 0x00, 0x40]
        );
        assert_eq!(
            AlarmMask::from(Alarm2Rate::EveryMinute).bits(),
            [0x00, 0x80, 0x80, 0x80]
        );
        assert_eq!(
            AlarmMask::from(Alarm2Rate::MatchHours).bits(),
            [0x00, 0x00, 0x00, 0x80]
        );
    }
}
