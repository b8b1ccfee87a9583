use crate::input::Location;

/// Convective and conductive parameters of the pipe thermal circuit,
/// in W/(m2.K) for film coefficients and W/(m.K) for conductivities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThermalProperties {
    /// Film coefficient between the carrier fluid and the pipe wall.
    pub water_film_coefficient: f64,
    /// Film coefficient towards free air for surface-laid pipes.
    pub surface_film_coefficient: f64,
    /// Film coefficient inside a ventilated concrete channel.
    pub channel_film_coefficient: f64,
    /// Effective film coefficient towards the ground for buried pipes.
    pub soil_film_coefficient: f64,
    /// Conductivity of the steel pipe wall.
    pub pipe_conductivity: f64,
    /// Conductivity of intact insulation.
    pub intact_insulation_conductivity: f64,
    /// Conductivity assumed for damaged insulation.
    pub damaged_insulation_conductivity: f64,
}

impl Default for ThermalProperties {
    fn default() -> Self {
        Self {
            water_film_coefficient: 3000.,
            surface_film_coefficient: 200.,
            channel_film_coefficient: 100.,
            soil_film_coefficient: 3.,
            pipe_conductivity: 43.,
            intact_insulation_conductivity: 0.03,
            damaged_insulation_conductivity: 0.03,
        }
    }
}

impl ThermalProperties {
    /// Film coefficient on the ambient side of a segment, in W/(m2.K).
    pub fn external_film_coefficient(&self, location: Location) -> f64 {
        match location {
            Location::Surface => self.surface_film_coefficient,
            Location::Channel => self.channel_film_coefficient,
            Location::Soil => self.soil_film_coefficient,
        }
    }
}

/// Ambient temperatures on the far side of each installation location, in degC.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientTemperatures {
    pub surface_c: f64,
    pub channel_c: f64,
    pub soil_c: f64,
}

impl Default for AmbientTemperatures {
    fn default() -> Self {
        Self {
            surface_c: 3.5,
            channel_c: 30.,
            soil_c: 10.,
        }
    }
}

impl AmbientTemperatures {
    pub fn for_location(&self, location: Location) -> f64 {
        match location {
            Location::Surface => self.surface_c,
            Location::Channel => self.channel_c,
            Location::Soil => self.soil_c,
        }
    }
}
