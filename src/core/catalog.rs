use crate::core::units::MILLIMETRES_IN_METRE;
use crate::errors::{ConfigurationError, ModelError};
use crate::input::{Direction, Location};
use indexmap::IndexMap;
use serde::Deserialize;
use std::io::Read;

/// Manufacturer thickness tables for the pipes a network is built from:
/// wall thickness by nominal size, and standard insulation thickness by
/// line, installation location and nominal size. All stored values are in
/// mm, as in the catalogue files; accessors convert to m.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PipeCatalog {
    thickness_data: ThicknessData,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct ThicknessData {
    th_pipe: IndexMap<String, f64>,
    th_insulation_channel_supply: IndexMap<String, f64>,
    th_insulation_surface_supply: IndexMap<String, f64>,
    th_insulation_soil_supply: IndexMap<String, f64>,
    th_insulation_channel_return: IndexMap<String, f64>,
    th_insulation_surface_return: IndexMap<String, f64>,
    th_insulation_soil_return: IndexMap<String, f64>,
}

impl PipeCatalog {
    pub fn from_json(catalog: impl Read) -> Result<Self, ModelError> {
        Ok(serde_json::from_reader(catalog)?)
    }

    /// Wall thickness for a nominal pipe size, in m.
    pub fn wall_thickness_m(&self, nominal: &str) -> Result<f64, ConfigurationError> {
        self.thickness_data
            .th_pipe
            .get(nominal)
            .map(|thickness_mm| thickness_mm / MILLIMETRES_IN_METRE as f64)
            .ok_or_else(|| ConfigurationError::UnknownPipeSize {
                nominal: nominal.to_string(),
            })
    }

    /// Standard (undamaged) insulation thickness for a nominal pipe size on
    /// one line at one installation location, in m.
    pub fn insulation_thickness_m(
        &self,
        line: Direction,
        location: Location,
        nominal: &str,
    ) -> Result<f64, ConfigurationError> {
        let table = match (line, location) {
            (Direction::Supply, Location::Channel) => {
                &self.thickness_data.th_insulation_channel_supply
            }
            (Direction::Supply, Location::Surface) => {
                &self.thickness_data.th_insulation_surface_supply
            }
            (Direction::Supply, Location::Soil) => &self.thickness_data.th_insulation_soil_supply,
            (Direction::Return, Location::Channel) => {
                &self.thickness_data.th_insulation_channel_return
            }
            (Direction::Return, Location::Surface) => {
                &self.thickness_data.th_insulation_surface_return
            }
            (Direction::Return, Location::Soil) => &self.thickness_data.th_insulation_soil_return,
        };
        table
            .get(nominal)
            .map(|thickness_mm| thickness_mm / MILLIMETRES_IN_METRE as f64)
            .ok_or_else(|| ConfigurationError::UnknownInsulationSize {
                line,
                location,
                nominal: nominal.to_string(),
            })
    }
}
