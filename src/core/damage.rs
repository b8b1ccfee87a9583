use crate::errors::ConfigurationError;
use crate::input::{BranchConfig, BranchInput, Direction};

/// Damage treatment selectable on a run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DamageMode {
    /// Segments without a recorded damage value get one average damaged
    /// insulation thickness.
    #[default]
    Average,
    /// Every segment keeps the catalogue thickness scaled by its own
    /// recorded fraction.
    Element,
}

/// How insulation damage enters each segment's geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum DamageSpec {
    /// Insulation thickness in m applied wherever a segment records no
    /// damage value, together with the damaged conductivity. Segments with a
    /// recorded value keep their catalogue thickness.
    Average(f64),
    /// One remaining-thickness fraction per segment and line, applied to the
    /// catalogue thickness with the intact conductivity.
    PerElement {
        supply: Vec<f64>,
        return_line: Vec<f64>,
    },
}

impl DamageSpec {
    /// Build the damage layout a mode implies for a given run. Element mode
    /// takes its fractions from the values recorded in the dataset itself.
    pub fn from_mode(mode: DamageMode, config: &BranchConfig, input: &BranchInput) -> Self {
        match mode {
            DamageMode::Average => Self::Average(config.average_damage_thickness_m),
            DamageMode::Element => Self::PerElement {
                supply: input
                    .supply
                    .iter()
                    .map(|segment| segment.insulation_damage)
                    .collect(),
                return_line: input
                    .return_line
                    .iter()
                    .map(|segment| segment.insulation_damage)
                    .collect(),
            },
        }
    }

    pub fn validate(&self, input: &BranchInput) -> Result<(), ConfigurationError> {
        match self {
            Self::Average(thickness_m) => {
                if !(0. ..=1.).contains(thickness_m) {
                    return Err(ConfigurationError::AverageDamageOutOfRange(*thickness_m));
                }
            }
            Self::PerElement {
                supply,
                return_line,
            } => {
                validate_fractions(Direction::Supply, supply, input.supply.len())?;
                validate_fractions(Direction::Return, return_line, input.return_line.len())?;
            }
        }
        Ok(())
    }

    pub(crate) fn for_line(&self, line: Direction) -> LineDamage<'_> {
        match self {
            Self::Average(thickness_m) => LineDamage::Average(*thickness_m),
            Self::PerElement {
                supply,
                return_line,
            } => LineDamage::PerElement(match line {
                Direction::Supply => supply,
                Direction::Return => return_line,
            }),
        }
    }
}

fn validate_fractions(
    line: Direction,
    fractions: &[f64],
    expected: usize,
) -> Result<(), ConfigurationError> {
    if fractions.len() != expected {
        return Err(ConfigurationError::DamageLengthMismatch {
            line,
            expected,
            actual: fractions.len(),
        });
    }
    for (index, fraction) in fractions.iter().enumerate() {
        if !(0. ..=1.).contains(fraction) {
            return Err(ConfigurationError::DamageFractionOutOfRange {
                line,
                index,
                value: *fraction,
            });
        }
    }
    Ok(())
}

/// A damage spec restricted to the line currently being marched.
#[derive(Clone, Copy, Debug)]
pub(crate) enum LineDamage<'a> {
    Average(f64),
    PerElement(&'a [f64]),
}
