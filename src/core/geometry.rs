use crate::core::catalog::PipeCatalog;
use crate::core::damage::LineDamage;
use crate::core::thermal::ThermalProperties;
use crate::errors::{ConfigurationError, DomainError, ModelError};
use crate::input::{Direction, Segment};

/// Geometry of one segment's thermal circuit after catalogue lookups and
/// damage treatment have been applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SegmentGeometry {
    pub(crate) internal_diameter_m: f64,
    pub(crate) insulation_diameter_m: f64,
    pub(crate) insulation_conductivity: f64,
}

/// Resolve the bore, insulation shell and insulation conductivity of one
/// segment.
///
/// Arguments:
/// * `segment` - the segment as ingested
/// * `line` - which line of the branch it belongs to
/// * `index` - its position on that line
/// * `damage` - the damage treatment of that line
/// * `catalog` - wall and insulation thickness tables
/// * `thermal` - conductivities to pair with the chosen thickness
pub(crate) fn resolve_segment(
    segment: &Segment,
    line: Direction,
    index: usize,
    damage: LineDamage<'_>,
    catalog: &PipeCatalog,
    thermal: &ThermalProperties,
) -> Result<SegmentGeometry, ModelError> {
    let wall_thickness_m = catalog.wall_thickness_m(&segment.nominal_size)?;
    let internal_diameter_m = segment.external_diameter_m - 2. * wall_thickness_m;
    if internal_diameter_m <= 0. {
        return Err(DomainError::DegenerateSegment {
            line,
            index,
            detail: format!(
                "wall thickness {} m leaves no bore in a pipe of {} m external diameter",
                wall_thickness_m, segment.external_diameter_m
            ),
        }
        .into());
    }

    let (insulation_thickness_m, insulation_conductivity) = match damage {
        LineDamage::Average(average_thickness_m) => {
            if segment.insulation_damage == 0. {
                (average_thickness_m, thermal.damaged_insulation_conductivity)
            } else {
                (
                    catalog.insulation_thickness_m(line, segment.location, &segment.nominal_size)?,
                    thermal.intact_insulation_conductivity,
                )
            }
        }
        LineDamage::PerElement(fractions) => {
            let fraction = fractions.get(index).copied().ok_or(
                ConfigurationError::DamageLengthMismatch {
                    line,
                    expected: index + 1,
                    actual: fractions.len(),
                },
            )?;
            (
                catalog.insulation_thickness_m(line, segment.location, &segment.nominal_size)?
                    * fraction,
                thermal.intact_insulation_conductivity,
            )
        }
    };

    Ok(SegmentGeometry {
        internal_diameter_m,
        insulation_diameter_m: segment.external_diameter_m + 2. * insulation_thickness_m,
        insulation_conductivity,
    })
}
