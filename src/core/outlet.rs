use thiserror::Error;

/// Iteration ceiling for the outlet temperature fixed point.
pub(crate) const MAX_ITERATIONS: usize = 100;

#[derive(Clone, Debug, Error)]
pub(crate) enum OutletSolveError {
    #[error("heat capacity flow must be positive, not {0} W/K")]
    NonPositiveHeatCapacityFlow(f64),
    #[error("log mean temperature needs positive temperatures (t_in = {t_in_c} degC, t_out = {t_out_c} degC)")]
    NonPositiveTemperature { t_in_c: f64, t_out_c: f64 },
    #[error("no convergence within {0} iterations")]
    NotConverged(usize),
}

/// Solve the outlet temperature of one pipe element and the heat it loses on
/// the way, as the fixed point of heat loss over the element's thermal
/// resistance against enthalpy drop of the flow. Returns `(t_out, qdot_loss)`
/// in (degC, W).
///
/// The driving temperature of each pass is the log mean of inlet and outlet
/// temperature in degC, falling back to their arithmetic mean when the two
/// coincide. If the flow equilibrates with the ambient before the end of the
/// element, the outlet temperature is pinned to the ambient and the last
/// heat loss estimate is kept.
///
/// Arguments:
/// * `inlet_temperature` - fluid temperature entering the element, in degC
/// * `ambient_temperature` - temperature on the far side of the circuit, in degC
/// * `heat_capacity_flow` - mass flow times specific heat capacity, in W/K
/// * `total_resistance` - series resistance of the element, in K/W
/// * `tolerance` - relative change of outlet temperature at which to stop
pub(crate) fn solve_outlet(
    inlet_temperature: f64,
    ambient_temperature: f64,
    heat_capacity_flow: f64,
    total_resistance: f64,
    tolerance: f64,
) -> Result<(f64, f64), OutletSolveError> {
    if heat_capacity_flow <= 0. {
        return Err(OutletSolveError::NonPositiveHeatCapacityFlow(
            heat_capacity_flow,
        ));
    }

    let mut qdot_loss = (inlet_temperature - ambient_temperature) / total_resistance;
    let mut reference = inlet_temperature;
    let mut outlet_temperature = inlet_temperature - qdot_loss / heat_capacity_flow;

    for _ in 0..MAX_ITERATIONS {
        if ((reference - outlet_temperature) / reference).abs() <= tolerance {
            return Ok((outlet_temperature, qdot_loss));
        }
        if outlet_temperature <= ambient_temperature {
            return Ok((ambient_temperature, qdot_loss));
        }
        if inlet_temperature <= 0. || outlet_temperature <= 0. {
            return Err(OutletSolveError::NonPositiveTemperature {
                t_in_c: inlet_temperature,
                t_out_c: outlet_temperature,
            });
        }

        let log_denominator = inlet_temperature.ln() - outlet_temperature.ln();
        let driving_temperature = if log_denominator == 0. {
            (inlet_temperature + outlet_temperature) / 2.
        } else {
            (inlet_temperature - outlet_temperature) / log_denominator
        };

        qdot_loss = (driving_temperature - ambient_temperature) / total_resistance;
        reference = outlet_temperature;
        outlet_temperature = inlet_temperature - qdot_loss / heat_capacity_flow;
    }

    Err(OutletSolveError::NotConverged(MAX_ITERATIONS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    // series resistance of a DN 150 element with 60 mm insulation over 12.5 m
    const RESISTANCE: f64 = 0.23849113003878866;

    #[rstest]
    fn should_converge_on_a_typical_segment() {
        let (t_out, qdot_loss) =
            solve_outlet(130., 30., 5. * 4184., RESISTANCE, 1e-9).unwrap();
        assert_relative_eq!(t_out, 129.97995885333438, max_relative = 1e-9);
        assert_relative_eq!(qdot_loss, 419.26078824480896, max_relative = 1e-9);
    }

    #[rstest]
    #[case(130., 30., 20_920.)]
    #[case(95., 10., 8_368.)]
    #[case(60., 3.5, 2_092.)]
    #[case(134.443, 10., 220_000.)]
    fn should_keep_the_outlet_between_ambient_and_inlet(
        #[case] t_in: f64,
        #[case] t_amb: f64,
        #[case] heat_capacity_flow: f64,
    ) {
        let (t_out, _) =
            solve_outlet(t_in, t_amb, heat_capacity_flow, RESISTANCE, 1e-3).unwrap();
        assert!(t_out <= t_in);
        assert!(t_out >= t_amb);
    }

    #[rstest]
    #[case(130., 30., 20_920., 1e-9)]
    #[case(95., 10., 8_368., 1e-6)]
    #[case(60., 3.5, 2_092., 1e-9)]
    fn should_conserve_energy_between_loss_and_enthalpy_drop(
        #[case] t_in: f64,
        #[case] t_amb: f64,
        #[case] heat_capacity_flow: f64,
        #[case] tolerance: f64,
    ) {
        let (t_out, qdot_loss) =
            solve_outlet(t_in, t_amb, heat_capacity_flow, RESISTANCE, tolerance).unwrap();
        assert_relative_eq!(
            qdot_loss,
            heat_capacity_flow * (t_in - t_out),
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn should_pin_a_starved_flow_to_the_ambient() {
        // 4 W/K cannot carry the seed loss of ~419 W across 100 K
        let (t_out, qdot_loss) = solve_outlet(130., 30., 4., RESISTANCE, 1e-3).unwrap();
        assert_eq!(t_out, 30.);
        assert_relative_eq!(qdot_loss, 419.30280586844384, max_relative = 1e-9);
    }

    #[rstest]
    fn should_pin_a_cold_line_warming_up_to_the_ambient() {
        let (t_out, qdot_loss) = solve_outlet(20., 30., 100., RESISTANCE, 1e-3).unwrap();
        assert_eq!(t_out, 30.);
        assert_relative_eq!(qdot_loss, -41.93028058684438, max_relative = 1e-9);
    }

    #[rstest]
    #[case(0.)]
    #[case(-5.)]
    fn should_reject_non_positive_heat_capacity_flow(#[case] heat_capacity_flow: f64) {
        assert!(matches!(
            solve_outlet(130., 30., heat_capacity_flow, RESISTANCE, 1e-3),
            Err(OutletSolveError::NonPositiveHeatCapacityFlow(value)) if value == heat_capacity_flow
        ));
    }

    #[rstest]
    fn should_reject_non_positive_temperatures_entering_the_log_mean() {
        assert!(matches!(
            solve_outlet(-5., -40., 100., 1., 1e-3),
            Err(OutletSolveError::NonPositiveTemperature { .. })
        ));
    }

    #[rstest]
    fn should_give_up_when_the_tolerance_is_unreachable() {
        assert!(matches!(
            solve_outlet(130., 30., 20_920., RESISTANCE, -1.),
            Err(OutletSolveError::NotConverged(MAX_ITERATIONS))
        ));
    }
}
