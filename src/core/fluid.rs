use crate::errors::ConfigurationError;
use std::fmt::Debug;
use std::sync::{Arc, LazyLock};

/// This module contains the fluid property model the pipeline calculation
/// samples, and a constant-property implementation of it.

/// State functions of the heat carrier fluid.
///
/// The engine only ever samples single-phase liquid states, so both functions
/// take the full (pressure, temperature) state even though simple
/// implementations may ignore part of it. A backend wrapping a real property
/// library can implement this trait and be passed to the branch unchanged.
pub trait FluidProperties: Debug + Send + Sync {
    /// Return the density of the fluid, in kg/m3
    ///
    /// Arguments:
    /// * `pressure_pa` - absolute pressure, in Pa
    /// * `temperature_k` - temperature, in K
    fn density(&self, pressure_pa: f64, temperature_k: f64) -> anyhow::Result<f64>;

    /// Return the specific heat capacity of the fluid, in J/(kg.K)
    ///
    /// Arguments:
    /// * `pressure_pa` - absolute pressure, in Pa
    /// * `temperature_k` - temperature, in K
    fn specific_heat(&self, pressure_pa: f64, temperature_k: f64) -> anyhow::Result<f64>;
}

/// A fluid with state-independent properties.
#[derive(Clone, Copy, Debug)]
pub struct ConstantFluid {
    density: f64,                // kg/m3
    specific_heat_capacity: f64, // J/(kg.K)
}

impl ConstantFluid {
    pub fn new(density: f64, specific_heat_capacity: f64) -> Self {
        Self {
            density,
            specific_heat_capacity,
        }
    }
}

impl FluidProperties for ConstantFluid {
    fn density(&self, _pressure_pa: f64, _temperature_k: f64) -> anyhow::Result<f64> {
        Ok(self.density)
    }

    fn specific_heat(&self, _pressure_pa: f64, _temperature_k: f64) -> anyhow::Result<f64> {
        Ok(self.specific_heat_capacity)
    }
}

pub static WATER: LazyLock<ConstantFluid> = LazyLock::new(|| ConstantFluid::new(1000.0, 4184.0));

/// Resolve the fluid named in a run configuration to a property model.
pub fn fluid_for_name(name: &str) -> Result<Arc<dyn FluidProperties>, ConfigurationError> {
    if name.eq_ignore_ascii_case("water") {
        Ok(Arc::new(*WATER))
    } else {
        Err(ConfigurationError::UnknownFluid(name.to_string()))
    }
}
