use std::f64::consts::PI;
use thiserror::Error;

/// A straight pipeline element modelled as a series thermal circuit from the
/// carrier fluid to the ambient: fluid film, pipe wall, insulation and outer
/// film. Resistances are absolute (the element length is folded in), so heat
/// flows derived from them are in W rather than W/m.
#[derive(Clone, Copy, Debug)]
pub struct PipeElement {
    fluid_film_resistance: f64,    // in K / W
    wall_resistance: f64,          // in K / W
    insulation_resistance: f64,    // in K / W
    external_film_resistance: f64, // in K / W
}

#[derive(Clone, Debug, Error)]
pub enum PipeGeometryError {
    #[error("{name} must be positive, not {value}")]
    NonPositiveQuantity { name: &'static str, value: f64 },
    #[error("diameters must not decrease from bore ({internal_m} m) over pipe ({external_m} m) to insulation ({insulation_m} m)")]
    NonIncreasingDiameters {
        internal_m: f64,
        external_m: f64,
        insulation_m: f64,
    },
}

impl PipeElement {
    /// Arguments:
    /// * `internal_diameter` - bore of the pipe, in m
    /// * `external_diameter` - outer diameter of the bare pipe, in m
    /// * `insulation_diameter` - outer diameter including the insulation, in m
    ///   (equal to the external diameter for a stripped pipe)
    /// * `length` - length of the element, in m
    /// * `k_pipe` - thermal conductivity of the pipe wall, in W / m K
    /// * `k_insulation` - thermal conductivity of the insulation, in W / m K
    /// * `internal_htc` - film coefficient on the fluid side, in W / m^2 K
    /// * `external_htc` - film coefficient on the ambient side, in W / m^2 K
    pub fn new(
        internal_diameter: f64,
        external_diameter: f64,
        insulation_diameter: f64,
        length: f64,
        k_pipe: f64,
        k_insulation: f64,
        internal_htc: f64,
        external_htc: f64,
    ) -> Result<Self, PipeGeometryError> {
        for (name, value) in [
            ("internal diameter", internal_diameter),
            ("external diameter", external_diameter),
            ("length", length),
            ("pipe wall conductivity", k_pipe),
            ("insulation conductivity", k_insulation),
            ("internal film coefficient", internal_htc),
            ("external film coefficient", external_htc),
        ] {
            if value <= 0. {
                return Err(PipeGeometryError::NonPositiveQuantity { name, value });
            }
        }
        if external_diameter <= internal_diameter || insulation_diameter < external_diameter {
            return Err(PipeGeometryError::NonIncreasingDiameters {
                internal_m: internal_diameter,
                external_m: external_diameter,
                insulation_m: insulation_diameter,
            });
        }

        // Convection at the fluid-wall interface, in K / W
        let fluid_film_resistance = 1. / (PI * internal_diameter * length * internal_htc);

        // Conduction through the pipe wall, in K / W
        let wall_resistance =
            (external_diameter / internal_diameter).ln() / (2. * PI * length * k_pipe);

        // Conduction through the insulation shell, in K / W (zero for a
        // stripped pipe, where both diameters coincide)
        let insulation_resistance =
            (insulation_diameter / external_diameter).ln() / (2. * PI * length * k_insulation);

        // Convection from the outer surface to the ambient, in K / W
        let external_film_resistance = 1. / (PI * insulation_diameter * length * external_htc);

        Ok(Self {
            fluid_film_resistance,
            wall_resistance,
            insulation_resistance,
            external_film_resistance,
        })
    }

    /// Total series resistance between fluid and ambient, in K / W.
    pub fn total_resistance(&self) -> f64 {
        self.fluid_film_resistance
            + self.wall_resistance
            + self.insulation_resistance
            + self.external_film_resistance
    }

    /// Steady heat loss of the whole element for fixed fluid and ambient
    /// temperatures, in W.
    ///
    /// Arguments:
    /// * `inside_temp` - temperature of the fluid in the pipe, in degrees C
    /// * `outside_temp` - temperature on the far side of the circuit, in degrees C
    pub fn heat_loss(&self, inside_temp: f64, outside_temp: f64) -> f64 {
        (inside_temp - outside_temp) / self.total_resistance()
    }
}
