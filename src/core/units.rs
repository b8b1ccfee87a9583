use thiserror::Error;

pub const MILLIMETRES_IN_METRE: u32 = 1_000;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const WATTS_PER_MEGAWATT: u32 = 1_000_000;

pub(crate) const CELSIUS_OFFSET_IN_KELVIN: f64 = 273.15;

pub(crate) fn celsius_to_kelvin(temp_c: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_c < -CELSIUS_OFFSET_IN_KELVIN {
        Err(BelowAbsoluteZeroError::from_c(temp_c))
    } else {
        Ok(temp_c + CELSIUS_OFFSET_IN_KELVIN)
    }
}

#[derive(Clone, Copy, Debug, Error)]
#[error("A temperature of {k}ºK/{}ºC was encountered, which is less than absolute zero", k - CELSIUS_OFFSET_IN_KELVIN)]
pub struct BelowAbsoluteZeroError {
    k: f64,
}

impl BelowAbsoluteZeroError {
    fn from_c(c: f64) -> Self {
        Self {
            k: c + CELSIUS_OFFSET_IN_KELVIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_do_correct_temperature_conversions() {
        assert_eq!(
            celsius_to_kelvin(20.0).unwrap(),
            293.15,
            "incorrect conversion of Celsius to Kelvin"
        );
        assert_eq!(
            celsius_to_kelvin(-273.15).unwrap(),
            0.,
            "absolute zero itself should convert"
        );
    }

    #[rstest]
    fn should_reject_temperatures_below_absolute_zero() {
        assert!(celsius_to_kelvin(-274.).is_err());
    }
}
