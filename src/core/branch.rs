use crate::core::catalog::PipeCatalog;
use crate::core::damage::{DamageSpec, LineDamage};
use crate::core::fluid::{fluid_for_name, FluidProperties};
use crate::core::geometry::resolve_segment;
use crate::core::outlet::{solve_outlet, OutletSolveError};
use crate::core::pipe::PipeElement;
use crate::core::thermal::{AmbientTemperatures, ThermalProperties};
use crate::core::units::{celsius_to_kelvin, SECONDS_PER_HOUR, WATTS_PER_MEGAWATT};
use crate::errors::{ConvergenceFailure, DomainError, ModelError, SequencingError};
use crate::input::{BranchConfig, BranchInput, Direction, Segment};
use std::f64::consts::PI;
use std::sync::Arc;

/// State of one node of the calculation, threaded from segment to segment
/// along a line and reset between lines.
#[derive(Clone, Copy, Debug)]
struct FlowState {
    temperature_c: f64,
    mass_flow_kg_per_s: f64,
    position_m: f64,
    cumulative_heat_loss_w: f64,
    total_heat_flow_w: f64,
}

/// Everything the calculation derives for one pipe segment. Records are
/// appended in traversal order and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct PipeRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Distance of the segment's outlet node from the branch head, in m.
    pub position_m: f64,
    /// Outlet temperature of the segment, in degC.
    pub temperature_c: f64,
    /// Mass flow through the segment (before its take-off), in kg/s.
    pub mass_flow_kg_per_s: f64,
    pub heat_loss_w: f64,
    pub heat_loss_w_per_m: f64,
    /// Heat lost between the line inlet and this node, in W.
    pub cumulative_heat_loss_w: f64,
    pub velocity_m_per_s: f64,
    /// Consumer flow at the outlet node, in kg/s: the recorded take-off on
    /// the supply line, the reconciled re-entry flow on the return line.
    pub consumer_mass_flow_kg_per_s: f64,
    /// Heat flow carried to the consumer, absolute (referenced to 0 K), in W.
    pub consumer_heat_flow_w: f64,
    /// Heat flow the consumer can actually use, relative to the release
    /// temperature, in W.
    pub consumer_useful_heat_flow_w: f64,
    /// Running total heat flow of the line at this node, absolute, in W.
    pub total_heat_flow_w: f64,
}

/// Net heat flow of the system at one supply node, in MW.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub position_m: f64,
    pub net_heat_flow_mw: f64,
}

/// The three record sequences of a completed run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BranchResults {
    pub supply: Vec<PipeRecord>,
    pub return_line: Vec<PipeRecord>,
    pub system: Vec<SystemRecord>,
}

/// One branch of a district heating network: a supply line from the head
/// towards the consumers and a return line back. Marches the supply line
/// first, then the return line (seeded with the supply's final mass flow),
/// then nets both into a system profile.
#[derive(Debug)]
pub struct Branch {
    config: BranchConfig,
    catalog: PipeCatalog,
    thermal: ThermalProperties,
    ambient: AmbientTemperatures,
    damage: DamageSpec,
    fluid: Arc<dyn FluidProperties>,
    input: BranchInput,
}

struct ElementStep {
    outlet_temperature_c: f64,
    heat_loss_w: f64,
    velocity_m_per_s: f64,
    specific_heat: f64, // in J/(kg.K), sampled at the segment inlet
}

impl Branch {
    /// Set up a branch with the default thermal environment and the fluid
    /// named in the configuration.
    pub fn new(
        config: BranchConfig,
        catalog: PipeCatalog,
        input: BranchInput,
        damage: DamageSpec,
    ) -> Result<Self, ModelError> {
        let fluid = fluid_for_name(&config.fluid)?;
        Self::with_environment(
            config,
            catalog,
            input,
            damage,
            ThermalProperties::default(),
            AmbientTemperatures::default(),
            fluid,
        )
    }

    pub fn with_environment(
        config: BranchConfig,
        catalog: PipeCatalog,
        input: BranchInput,
        damage: DamageSpec,
        thermal: ThermalProperties,
        ambient: AmbientTemperatures,
        fluid: Arc<dyn FluidProperties>,
    ) -> Result<Self, ModelError> {
        damage.validate(&input)?;
        Ok(Self {
            config,
            catalog,
            thermal,
            ambient,
            damage,
            fluid,
            input,
        })
    }

    /// Length of the branch as the sum of its supply segment lengths, in m.
    pub fn branch_length(&self) -> f64 {
        self.input
            .supply
            .iter()
            .map(|segment| segment.length_m)
            .sum()
    }

    /// Run the full calculation: supply line, return line, system profile.
    pub fn run(&self) -> Result<BranchResults, ModelError> {
        let supply = self.calculate_supply()?;
        let return_line = self.calculate_return(&supply)?;
        let system = self.calculate_system(&supply, &return_line)?;
        Ok(BranchResults {
            supply,
            return_line,
            system,
        })
    }

    /// March the supply line from the branch head outwards, one record per
    /// segment.
    pub fn calculate_supply(&self) -> Result<Vec<PipeRecord>, ModelError> {
        let damage = self.damage.for_line(Direction::Supply);
        let inlet_temperature_c = self.config.supply_inlet_temperature_c;
        let inlet_k = celsius_to_kelvin(inlet_temperature_c)?;
        let density = self.fluid.density(self.config.pressure_pa, inlet_k)?;
        let specific_heat = self.fluid.specific_heat(self.config.pressure_pa, inlet_k)?;
        // the head node carries a volumetric flow reading, not a mass flow
        let mass_flow_kg_per_s =
            self.config.volumetric_flow_m3_per_h * density / SECONDS_PER_HOUR as f64;

        let mut state = FlowState {
            temperature_c: inlet_temperature_c,
            mass_flow_kg_per_s,
            position_m: 0.,
            cumulative_heat_loss_w: 0.,
            total_heat_flow_w: mass_flow_kg_per_s * inlet_k * specific_heat,
        };
        let mut records = Vec::with_capacity(self.input.supply.len());

        for (index, segment) in self.input.supply.iter().enumerate() {
            let step = self.solve_element(segment, Direction::Supply, index, damage, &state)?;

            state.position_m += segment.length_m;
            state.cumulative_heat_loss_w += step.heat_loss_w;

            let outlet_k = celsius_to_kelvin(step.outlet_temperature_c)?;
            let consumer_flow = segment.consumer_mass_flow_kg_per_s;
            let consumer_heat_flow_w = consumer_flow.abs() * step.specific_heat * outlet_k;
            let consumer_useful_heat_flow_w = consumer_flow.abs()
                * step.specific_heat
                * (step.outlet_temperature_c - self.config.release_temperature_c);
            state.total_heat_flow_w -= step.heat_loss_w + consumer_heat_flow_w;

            records.push(PipeRecord {
                latitude: segment.latitude,
                longitude: segment.longitude,
                position_m: state.position_m,
                temperature_c: step.outlet_temperature_c,
                mass_flow_kg_per_s: state.mass_flow_kg_per_s,
                heat_loss_w: step.heat_loss_w,
                heat_loss_w_per_m: step.heat_loss_w / segment.length_m,
                cumulative_heat_loss_w: state.cumulative_heat_loss_w,
                velocity_m_per_s: step.velocity_m_per_s,
                consumer_mass_flow_kg_per_s: consumer_flow,
                consumer_heat_flow_w,
                consumer_useful_heat_flow_w,
                total_heat_flow_w: state.total_heat_flow_w,
            });

            state.temperature_c = step.outlet_temperature_c;
            state.mass_flow_kg_per_s += consumer_flow;
        }

        Ok(records)
    }

    /// March the return line back towards the branch head. Needs the supply
    /// records: the return flow starts from the supply's final mass flow,
    /// and each return consumer is matched against the supply take-off it
    /// belongs to.
    pub fn calculate_return(&self, supply: &[PipeRecord]) -> Result<Vec<PipeRecord>, ModelError> {
        let last_supply = supply
            .last()
            .ok_or(SequencingError::ReturnBeforeSupply)?;

        let damage = self.damage.for_line(Direction::Return);
        let inlet_temperature_c = self.config.return_inlet_temperature_c;
        let inlet_k = celsius_to_kelvin(inlet_temperature_c)?;
        let specific_heat = self.fluid.specific_heat(self.config.pressure_pa, inlet_k)?;
        let mass_flow_kg_per_s = last_supply.mass_flow_kg_per_s;

        let mut state = FlowState {
            temperature_c: inlet_temperature_c,
            mass_flow_kg_per_s,
            position_m: self.branch_length(),
            cumulative_heat_loss_w: 0.,
            total_heat_flow_w: mass_flow_kg_per_s * inlet_k * specific_heat,
        };
        let mut reconciler = ReturnReconciler::new(supply);
        let mut records = Vec::with_capacity(self.input.return_line.len());

        for (index, segment) in self.input.return_line.iter().enumerate() {
            let step = self.solve_element(segment, Direction::Return, index, damage, &state)?;

            let consumer_flow = reconciler.consumer_flow(index, segment)?;
            let mixed_flow = state.mass_flow_kg_per_s + consumer_flow;
            if mixed_flow == 0. {
                return Err(DomainError::ZeroMixingFlow { index }.into());
            }
            // water released by the consumer mixes into the line downstream
            // of this segment
            let mixing_temperature_c = (step.outlet_temperature_c * state.mass_flow_kg_per_s
                + self.config.release_temperature_c * consumer_flow)
                / mixed_flow;

            state.position_m -= segment.length_m;
            state.cumulative_heat_loss_w += step.heat_loss_w;

            let outlet_k = celsius_to_kelvin(step.outlet_temperature_c)?;
            // consumer heat flows follow this line's own recorded take-off;
            // the reconciled flow only drives mixing and the record's flow
            let recorded_flow = segment.consumer_mass_flow_kg_per_s;
            let consumer_heat_flow_w = recorded_flow.abs() * step.specific_heat * outlet_k;
            let consumer_useful_heat_flow_w = recorded_flow.abs()
                * step.specific_heat
                * (step.outlet_temperature_c - self.config.release_temperature_c);
            state.total_heat_flow_w += consumer_heat_flow_w - step.heat_loss_w;

            records.push(PipeRecord {
                latitude: segment.latitude,
                longitude: segment.longitude,
                position_m: state.position_m,
                temperature_c: step.outlet_temperature_c,
                mass_flow_kg_per_s: state.mass_flow_kg_per_s,
                heat_loss_w: step.heat_loss_w,
                heat_loss_w_per_m: step.heat_loss_w / segment.length_m,
                cumulative_heat_loss_w: state.cumulative_heat_loss_w,
                velocity_m_per_s: step.velocity_m_per_s,
                consumer_mass_flow_kg_per_s: consumer_flow,
                consumer_heat_flow_w,
                consumer_useful_heat_flow_w,
                total_heat_flow_w: state.total_heat_flow_w,
            });

            state.temperature_c = mixing_temperature_c;
            state.mass_flow_kg_per_s = mixed_flow;
        }

        Ok(records)
    }

    /// Net the two lines into a system heat flow profile, one record per
    /// supply node against the return node nearest to it by position. The
    /// two lines may be discretised differently, so this is a nearest-match
    /// join, with ties resolved towards the branch head.
    pub fn calculate_system(
        &self,
        supply: &[PipeRecord],
        return_line: &[PipeRecord],
    ) -> Result<Vec<SystemRecord>, ModelError> {
        if supply.is_empty() {
            return Err(SequencingError::SystemBeforeLines.into());
        }
        if return_line.is_empty() {
            if self.input.return_line.is_empty() {
                return Ok(Vec::new());
            }
            return Err(SequencingError::SystemBeforeLines.into());
        }

        // return positions run tailwards; walk them head-first so both
        // sequences ascend and a single merge pass suffices
        let ascending: Vec<&PipeRecord> = return_line.iter().rev().collect();
        let mut nearest = 0;
        let mut records = Vec::with_capacity(supply.len());

        for record in supply {
            while nearest + 1 < ascending.len()
                && (ascending[nearest + 1].position_m - record.position_m).abs()
                    < (ascending[nearest].position_m - record.position_m).abs()
            {
                nearest += 1;
            }
            records.push(SystemRecord {
                latitude: record.latitude,
                longitude: record.longitude,
                position_m: record.position_m,
                net_heat_flow_mw: (record.total_heat_flow_w
                    - ascending[nearest].total_heat_flow_w)
                    / WATTS_PER_MEGAWATT as f64,
            });
        }

        Ok(records)
    }

    /// Resolve one segment's thermal circuit and solve its outlet state.
    fn solve_element(
        &self,
        segment: &Segment,
        line: Direction,
        index: usize,
        damage: LineDamage<'_>,
        state: &FlowState,
    ) -> Result<ElementStep, ModelError> {
        let geometry =
            resolve_segment(segment, line, index, damage, &self.catalog, &self.thermal)?;
        let element = PipeElement::new(
            geometry.internal_diameter_m,
            segment.external_diameter_m,
            geometry.insulation_diameter_m,
            segment.length_m,
            self.thermal.pipe_conductivity,
            geometry.insulation_conductivity,
            self.thermal.water_film_coefficient,
            self.thermal.external_film_coefficient(segment.location),
        )
        .map_err(|error| DomainError::DegenerateSegment {
            line,
            index,
            detail: error.to_string(),
        })?;

        let inlet_k = celsius_to_kelvin(state.temperature_c)?;
        let specific_heat = self.fluid.specific_heat(self.config.pressure_pa, inlet_k)?;
        let density = self.fluid.density(self.config.pressure_pa, inlet_k)?;

        let (outlet_temperature_c, heat_loss_w) = solve_outlet(
            state.temperature_c,
            self.ambient.for_location(segment.location),
            state.mass_flow_kg_per_s * specific_heat,
            element.total_resistance(),
            self.config.tolerance,
        )
        .map_err(|error| match error {
            OutletSolveError::NonPositiveHeatCapacityFlow(value_w_per_k) => {
                DomainError::ZeroHeatCapacityFlow {
                    line,
                    index,
                    value_w_per_k,
                }
                .into()
            }
            OutletSolveError::NonPositiveTemperature { t_in_c, t_out_c } => {
                DomainError::InvalidTemperature {
                    line,
                    index,
                    t_in_c,
                    t_out_c,
                }
                .into()
            }
            OutletSolveError::NotConverged(iterations) => {
                ModelError::Convergence(ConvergenceFailure {
                    line,
                    index,
                    iterations,
                })
            }
        })?;

        let velocity_m_per_s = 4. * state.mass_flow_kg_per_s
            / (PI * density * geometry.internal_diameter_m * geometry.internal_diameter_m);

        Ok(ElementStep {
            outlet_temperature_c,
            heat_loss_w,
            velocity_m_per_s,
            specific_heat,
        })
    }
}

/// Matches each return consumer to the supply take-off it came from.
///
/// The two lines may hold different numbers of segments, so matching is by
/// consumer order, not by index: a cursor starts at the supply tail and, for
/// every return segment with a recorded take-off, walks headwards to the
/// next supply node with a take-off and binds its negated flow.
struct ReturnReconciler<'a> {
    supply: &'a [PipeRecord],
    cursor: isize,
}

impl<'a> ReturnReconciler<'a> {
    fn new(supply: &'a [PipeRecord]) -> Self {
        Self {
            supply,
            cursor: supply.len() as isize - 1,
        }
    }

    /// Mass flow re-entering the line downstream of this return segment, in
    /// kg/s. Zero for segments without a recorded take-off.
    fn consumer_flow(
        &mut self,
        index: usize,
        segment: &Segment,
    ) -> Result<f64, crate::errors::ConfigurationError> {
        if segment.consumer_mass_flow_kg_per_s == 0. {
            return Ok(0.);
        }
        while self.cursor >= 0
            && self.supply[self.cursor as usize].consumer_mass_flow_kg_per_s == 0.
        {
            self.cursor -= 1;
        }
        if self.cursor < 0 {
            return Err(crate::errors::ConfigurationError::UnmatchedConsumer { index });
        }
        let flow = -self.supply[self.cursor as usize].consumer_mass_flow_kg_per_s;
        self.cursor -= 1;
        Ok(flow)
    }
}
