use crate::core::units::MILLIMETRES_IN_METRE;
use crate::errors::{ConfigurationError, DomainError, ModelError};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::str::FromStr;

/// Flow direction of one line of a branch.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    Supply,
    Return,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::Supply => "supply",
                Direction::Return => "return",
            }
        )
    }
}

impl FromStr for Direction {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Supply" => Ok(Direction::Supply),
            "Return" => Ok(Direction::Return),
            other => Err(ConfigurationError::InvalidDirection(other.to_string())),
        }
    }
}

/// Installation location of a pipe segment, which fixes the ambient side of
/// its thermal circuit.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Location {
    Channel,
    Surface,
    Soil,
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Location::Channel => "Channel",
                Location::Surface => "Surface",
                Location::Soil => "Soil",
            }
        )
    }
}

impl FromStr for Location {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Channel" => Ok(Location::Channel),
            "Surface" => Ok(Location::Surface),
            "Soil" => Ok(Location::Soil),
            other => Err(ConfigurationError::InvalidLocation(other.to_string())),
        }
    }
}

/// Run parameters of a branch calculation.
///
/// All fields default to the calibration of the reference network the tool
/// was built around, so a configuration file only needs to override what it
/// wants to change.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct BranchConfig {
    pub fluid: String,
    pub pressure_pa: f64,
    pub supply_inlet_temperature_c: f64,
    pub return_inlet_temperature_c: f64,
    /// Temperature at which consumers release water back into the return line, in degC.
    pub release_temperature_c: f64,
    /// Volumetric flow entering the branch head, in m3/h.
    pub volumetric_flow_m3_per_h: f64,
    /// Insulation thickness assumed for damaged segments in average damage mode, in m.
    pub average_damage_thickness_m: f64,
    /// Relative tolerance of the outlet temperature iteration.
    pub tolerance: f64,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            fluid: "Water".to_string(),
            pressure_pa: 16e5,
            supply_inlet_temperature_c: 134.443,
            return_inlet_temperature_c: 84.4,
            release_temperature_c: 85.,
            volumetric_flow_m3_per_h: 189.92,
            average_damage_thickness_m: 0.017,
            tolerance: 1e-3,
        }
    }
}

/// One pipe segment of a branch line, validated and converted to SI units.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Nominal size as a catalogue key, e.g. "150" for DN 150.
    pub nominal_size: String,
    pub external_diameter_m: f64,
    pub length_m: f64,
    pub location: Location,
    /// Recorded insulation damage for this segment, within [0, 1]. Zero means
    /// "no recorded value" in average damage mode and "fully stripped" in
    /// per-element mode.
    pub insulation_damage: f64,
    /// Consumer take-off at the downstream node, in kg/s. Take-offs drawing
    /// water out of the line are recorded negative.
    pub consumer_mass_flow_kg_per_s: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// The two ordered segment lists of a branch. Supply runs head-outwards;
/// return runs in its own file order back towards the head.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BranchInput {
    pub supply: Vec<Segment>,
    pub return_line: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SegmentRow {
    #[serde(rename = "Direction")]
    direction: String,
    #[serde(rename = "DN [mm]")]
    nominal_diameter_mm: f64,
    #[serde(rename = "Dext [mm]")]
    external_diameter_mm: f64,
    #[serde(rename = "L [m]")]
    length_m: f64,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Insulation")]
    insulation_damage: f64,
    #[serde(rename = "mdot take-off [kg/s]")]
    consumer_mass_flow_kg_per_s: f64,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

impl SegmentRow {
    fn into_segment(self, line: Direction, index: usize) -> Result<Segment, ModelError> {
        let location = self.location.parse::<Location>()?;
        if self.length_m <= 0. {
            return Err(DomainError::DegenerateSegment {
                line,
                index,
                detail: format!("length must be positive, not {} m", self.length_m),
            }
            .into());
        }
        if self.external_diameter_mm <= 0. {
            return Err(DomainError::DegenerateSegment {
                line,
                index,
                detail: format!(
                    "external diameter must be positive, not {} mm",
                    self.external_diameter_mm
                ),
            }
            .into());
        }
        if !(0. ..=1.).contains(&self.insulation_damage) {
            return Err(ConfigurationError::DamageFractionOutOfRange {
                line,
                index,
                value: self.insulation_damage,
            }
            .into());
        }
        Ok(Segment {
            // nominal sizes are written as numbers in the dataset but act as
            // catalogue keys, e.g. 150.0 -> "150"
            nominal_size: (self.nominal_diameter_mm as i64).to_string(),
            external_diameter_m: self.external_diameter_mm / MILLIMETRES_IN_METRE as f64,
            length_m: self.length_m,
            location,
            insulation_damage: self.insulation_damage,
            consumer_mass_flow_kg_per_s: self.consumer_mass_flow_kg_per_s,
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

/// Read a semicolon-separated pipeline dataset and split it into the supply
/// and return lines, preserving file order within each line.
pub fn read_branch_input(input: impl Read) -> Result<BranchInput, ModelError> {
    let mut reader = ReaderBuilder::new().delimiter(b';').from_reader(input);
    let mut branch = BranchInput::default();
    for row in reader.deserialize::<SegmentRow>() {
        let row = row?;
        let line = row.direction.parse::<Direction>()?;
        let segments = match line {
            Direction::Supply => &mut branch.supply,
            Direction::Return => &mut branch.return_line,
        };
        let segment = row.into_segment(line, segments.len())?;
        segments.push(segment);
    }
    if branch.supply.is_empty() {
        return Err(ConfigurationError::EmptyLine(Direction::Supply).into());
    }
    Ok(branch)
}
