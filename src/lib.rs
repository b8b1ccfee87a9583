#![allow(clippy::too_many_arguments)]

pub mod core;
pub mod errors;
pub mod input;
pub mod output;

pub use crate::core::branch::{Branch, BranchResults, PipeRecord, SystemRecord};
pub use crate::core::catalog::PipeCatalog;
pub use crate::core::damage::{DamageMode, DamageSpec};
pub use crate::errors::ModelError;
use crate::input::read_branch_input;
pub use crate::input::{BranchConfig, BranchInput, Direction, Location, Segment};
use crate::output::{write_pipe_records, write_system_records, Output};
use std::io::Read;
use tracing::info;

/// Location key the supply line results are written under.
pub const SUPPLY_OUTPUT_KEY: &str = "supply";
/// Location key the return line results are written under.
pub const RETURN_OUTPUT_KEY: &str = "return";
/// Location key the system profile is written under.
pub const SYSTEM_OUTPUT_KEY: &str = "system";

/// Run a whole branch calculation from readers over the segment dataset and
/// the thickness catalogue, writing one CSV per line plus the system profile
/// to the given output.
pub fn run_branch(
    input: impl Read,
    catalog: impl Read,
    config: BranchConfig,
    damage_mode: DamageMode,
    output: impl Output,
) -> Result<BranchResults, anyhow::Error> {
    let input = read_branch_input(input)?;
    let catalog = PipeCatalog::from_json(catalog)?;
    let damage = DamageSpec::from_mode(damage_mode, &config, &input);
    let branch = Branch::new(config, catalog, input, damage)?;

    info!(
        "marching a branch of {} m in {:?} damage mode",
        branch.branch_length(),
        damage_mode
    );
    let results = branch.run()?;
    info!(
        "calculated {} supply, {} return and {} system records",
        results.supply.len(),
        results.return_line.len(),
        results.system.len()
    );

    if !output.is_noop() {
        write_pipe_records(&output, SUPPLY_OUTPUT_KEY, &results.supply)?;
        write_pipe_records(&output, RETURN_OUTPUT_KEY, &results.return_line)?;
        write_system_records(&output, SYSTEM_OUTPUT_KEY, &results.system)?;
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SinkOutput;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    const DATASET: &str = "\
Direction;DN [mm];Dext [mm];L [m];Location;Insulation;mdot take-off [kg/s];Latitude;Longitude
Supply;150;160;12.5;Channel;0.4;0.0;46.36;15.11
Supply;150;160;8.0;Channel;0.4;-2.0;46.36;15.11
Return;150;160;10.5;Channel;0.4;-2.0;46.36;15.11
Return;150;160;10.0;Channel;0.4;0.0;46.36;15.11
";

    const CATALOG: &str = r#"{
        "thickness_data": {
            "th_pipe": {"150": 4.5},
            "th_insulation_channel_supply": {"150": 60.0},
            "th_insulation_surface_supply": {"150": 80.0},
            "th_insulation_soil_supply": {"150": 45.0},
            "th_insulation_channel_return": {"150": 35.0},
            "th_insulation_surface_return": {"150": 55.0},
            "th_insulation_soil_return": {"150": 30.0}
        }
    }"#;

    fn config() -> BranchConfig {
        BranchConfig {
            supply_inlet_temperature_c: 130.,
            return_inlet_temperature_c: 60.,
            volumetric_flow_m3_per_h: 18.,
            tolerance: 1e-9,
            ..Default::default()
        }
    }

    /// Remembers which location keys were written to, discarding the bytes.
    #[derive(Clone, Debug, Default)]
    struct KeyLog {
        keys: Arc<Mutex<Vec<String>>>,
    }

    impl Output for KeyLog {
        fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
            self.keys.lock().unwrap().push(location_key.to_string());
            Ok(io::sink())
        }
    }

    #[rstest]
    fn should_run_a_branch_end_to_end_from_readers() {
        let results = run_branch(
            DATASET.as_bytes(),
            CATALOG.as_bytes(),
            config(),
            DamageMode::Average,
            SinkOutput,
        )
        .unwrap();

        assert_eq!(results.supply.len(), 2);
        assert_eq!(results.return_line.len(), 2);
        assert_eq!(results.system.len(), 2);
        assert_relative_eq!(
            results.supply[1].total_heat_flow_w,
            5059926.273842767,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            results.return_line[1].temperature_c,
            67.13077856869448,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            results.system[0].net_heat_flow_mw,
            -1.3235911741119697,
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn should_write_one_file_per_line_and_one_for_the_system() {
        let output = KeyLog::default();
        run_branch(
            DATASET.as_bytes(),
            CATALOG.as_bytes(),
            config(),
            DamageMode::Average,
            output.clone(),
        )
        .unwrap();

        assert_eq!(
            *output.keys.lock().unwrap(),
            vec!["supply", "return", "system"]
        );
    }

    #[rstest]
    fn should_skip_writing_entirely_for_a_noop_output() {
        // SinkOutput reports itself a no-op, so the writers are never asked
        // for a writer at all
        let results = run_branch(
            DATASET.as_bytes(),
            CATALOG.as_bytes(),
            config(),
            DamageMode::Element,
            SinkOutput,
        )
        .unwrap();
        assert_eq!(results.supply.len(), 2);
    }

    #[rstest]
    fn should_surface_dataset_errors_through_the_run() {
        let broken = "\
Direction;DN [mm];Dext [mm];L [m];Location;Insulation;mdot take-off [kg/s];Latitude;Longitude
Sideways;150;160;12.5;Channel;0.4;0.0;46.36;15.11
";
        let error = run_branch(
            broken.as_bytes(),
            CATALOG.as_bytes(),
            config(),
            DamageMode::Average,
            SinkOutput,
        )
        .unwrap_err();
        assert!(error.to_string().contains("Sideways"));
    }
}
