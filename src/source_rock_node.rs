// src/source_rock_node.rs - one spatial cell: its input history, outputs and live state

use crate::error::{GenexError, Result};
use crate::node_input::SourceRockNodeInput;
use crate::node_output::SourceRockNodeOutput;
use crate::simulator::Simulator;
use crate::simulator_state::SimulatorState;
use log::{debug, warn};
use std::any::Any;

/// Observer called after every applied time step (not after initialization).
pub trait HistoryCollector: Send {
    /// The name of this collector (for identification and lookup)
    fn name(&self) -> &str;

    fn collect(&mut self, node: &SourceRockNode);

    fn as_any(&self) -> &dyn Any;
}

pub struct SourceRockNode {
    thickness: f64, // m
    toc: f64, // initial, wt%
    inorganic_density: f64, // kg/m³
    mean_bulk_density: f64, // kg/m³
    i: usize,
    j: usize,
    inputs: Vec<SourceRockNodeInput>,
    outputs: Vec<SourceRockNodeOutput>,
    state: Option<SimulatorState>,
    current_input: Option<SourceRockNodeInput>,
    current_output: Option<SourceRockNodeOutput>,
    collectors: Vec<Box<dyn HistoryCollector>>,
}

impl SourceRockNode {
    pub fn new(thickness: f64, toc: f64, inorganic_density: f64, mean_bulk_density: f64, i: usize, j: usize) -> Self {
        Self {
            thickness,
            toc,
            inorganic_density,
            mean_bulk_density,
            i,
            j,
            inputs: Vec::new(),
            outputs: Vec::new(),
            state: None,
            current_input: None,
            current_output: None,
            collectors: Vec::new(),
        }
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn toc(&self) -> f64 {
        self.toc
    }

    pub fn inorganic_density(&self) -> f64 {
        self.inorganic_density
    }

    pub fn mean_bulk_density(&self) -> f64 {
        self.mean_bulk_density
    }

    pub fn indices(&self) -> (usize, usize) {
        (self.i, self.j)
    }

    /// Appends an input; one without a declared start is chained after the previous input.
    pub fn add_input(&mut self, input: SourceRockNodeInput) {
        let input = match (input.previous_time, self.inputs.last()) {
            (None, Some(prior)) => input.chained_after(prior),
            _ => input,
        };
        self.inputs.push(input);
    }

    pub fn inputs(&self) -> &[SourceRockNodeInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[SourceRockNodeOutput] {
        &self.outputs
    }

    pub fn state(&self) -> Option<&SimulatorState> {
        self.state.as_ref()
    }

    /// The input of the most recently applied step, including 1-D sub-steps.
    pub fn last_computed_input(&self) -> Option<&SourceRockNodeInput> {
        self.current_input.as_ref()
    }

    /// The output of the most recently applied step, including 1-D sub-steps.
    pub fn last_output(&self) -> Option<&SourceRockNodeOutput> {
        self.current_output.as_ref()
    }

    pub fn add_history_collector(&mut self, collector: Box<dyn HistoryCollector>) {
        self.collectors.push(collector);
    }

    pub fn history_collectors(&self) -> &[Box<dyn HistoryCollector>] {
        &self.collectors
    }

    pub fn history_collector(&self, name: &str) -> Option<&dyn HistoryCollector> {
        self.collectors.iter().find(|c| c.name() == name).map(|c| c.as_ref())
    }

    /// Applies every input that has no output yet.
    pub fn request_computation(&mut self, simulator: &Simulator) -> Result<()> {
        for index in self.outputs.len()..self.inputs.len() {
            let input = self.inputs[index].clone();
            let initial = self.state.is_none();
            let output = self.apply(simulator, &input)?;
            self.outputs.push(output);
            if !initial {
                self.after_step(simulator);
            }
        }
        Ok(())
    }

    /// Drives the node through `snapshots`, sub-stepping between them at the
    /// simulator's maximum step size for a layer deposited at `deposition_age`.
    ///
    /// One input and one output are recorded per snapshot.
    pub fn request_computation_1d(
        &mut self,
        simulator: &Simulator,
        snapshots: &[SourceRockNodeInput],
        deposition_age: f64,
    ) -> Result<()> {
        let Some(present) = snapshots.last() else {
            return Ok(());
        };
        let maximum_step = simulator.maximum_time_step_size(deposition_age - present.current_time);
        if maximum_step.is_nan() || maximum_step <= 0.0 {
            return Err(GenexError::InvalidInput(format!(
                "maximum time step {} for deposition age {} Ma",
                maximum_step, deposition_age
            )));
        }

        for snapshot in snapshots {
            let Some(start) = self.current_input.clone() else {
                let output = self.apply(simulator, snapshot)?;
                self.inputs.push(snapshot.clone());
                self.outputs.push(output);
                continue;
            };

            let span = snapshot.current_time - start.current_time;
            let steps = ((span.abs() / maximum_step).ceil() as usize).max(1);
            let mut prior = start.clone();
            for step in 1..steps {
                let time = start.current_time + span * step as f64 / steps as f64;
                let sub_step = SourceRockNodeInput::interpolate(time, &start, snapshot).chained_after(&prior);
                self.apply(simulator, &sub_step)?;
                self.after_step(simulator);
                prior = sub_step;
            }

            let input = snapshot.clone().chained_after(&prior);
            let output = self.apply(simulator, &input)?;
            self.inputs.push(input);
            self.outputs.push(output);
            self.after_step(simulator);
        }
        Ok(())
    }

    fn apply(&mut self, simulator: &Simulator, input: &SourceRockNodeInput) -> Result<SourceRockNodeOutput> {
        let thickness = self.thickness * input.thickness_scale_factor;
        let output = if self.state.is_none() {
            debug!("initializing source rock node ({}, {}) at {} Ma", self.i, self.j, input.current_time);
            simulator.initialize_source_rock_node(
                input,
                &mut self.state,
                thickness,
                self.toc,
                self.inorganic_density,
                self.mean_bulk_density,
            )?
        } else {
            simulator.compute_source_rock_node_time_instance(input, &mut self.state, thickness)?
        };
        self.current_input = Some(input.clone());
        self.current_output = Some(output.clone());
        Ok(output)
    }

    fn after_step(&mut self, simulator: &Simulator) {
        self.check_mass_balance(simulator);
        self.collect_histories();
    }

    /// Mass-balance error (%) of the live state, if initialized.
    pub fn mass_balance_percent(&self, simulator: &Simulator) -> Option<f64> {
        let state = self.state.as_ref()?;
        Some(simulator.mass_balance_percent(state, state.thickness))
    }

    fn check_mass_balance(&self, simulator: &Simulator) {
        let Some(percent) = self.mass_balance_percent(simulator) else {
            return;
        };
        if percent > simulator.properties().mass_balance_percent_tolerance {
            warn!(
                "source rock node ({}, {}) mass balance off by {:.4}% at {} Ma",
                self.i,
                self.j,
                percent,
                self.current_input.as_ref().map(|i| i.current_time).unwrap_or_default()
            );
        }
    }

    fn collect_histories(&mut self) {
        let mut collectors = std::mem::take(&mut self.collectors);

        for collector in collectors.iter_mut() {
            collector.collect(self);
        }
        self.collectors = collectors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenexConfig;
    use crate::error::SequencingError;
    use crate::simulator::SourceRockType;

    struct StepCounter {
        times: Vec<f64>,
    }

    impl HistoryCollector for StepCounter {
        fn name(&self) -> &str {
            "StepCounter"
        }

        fn collect(&mut self, node: &SourceRockNode) {
            if let Some(input) = node.last_computed_input() {
                self.times.push(input.current_time);
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn simulator() -> Simulator {
        Simulator::from_config(&GenexConfig::default_config(), &SourceRockType::default()).unwrap()
    }

    #[test]
    fn test_inputs_are_chained() {
        let mut node = SourceRockNode::new(10.0, 5.0, 2700.0, 2500.0, 0, 0);
        node.add_input(SourceRockNodeInput::new(100.0, 20.0, 1.0e7));
        node.add_input(SourceRockNodeInput::new(90.0, 40.0, 2.0e7));
        assert_eq!(node.inputs()[0].previous_time, None);
        assert_eq!(node.inputs()[1].previous_time, Some(100.0));
        assert_eq!(node.inputs()[1].previous_temperature_c, Some(20.0));
    }

    #[test]
    fn test_collectors_skip_initialization() {
        let sim = simulator();
        let mut node = SourceRockNode::new(10.0, 5.0, 2700.0, 2500.0, 0, 0);
        node.add_history_collector(Box::new(StepCounter { times: Vec::new() }));
        for (time, temperature) in [(100.0, 20.0), (90.0, 40.0), (80.0, 60.0)] {
            node.add_input(SourceRockNodeInput::new(time, temperature, 1.0e7));
        }
        node.request_computation(&sim).unwrap();

        assert_eq!(node.outputs().len(), 3);
        let counter = node
            .history_collector("StepCounter")
            .and_then(|c| c.as_any().downcast_ref::<StepCounter>())
            .unwrap();
        assert_eq!(counter.times, vec![90.0, 80.0]);

        // nothing new to compute
        node.request_computation(&sim).unwrap();
        assert_eq!(node.outputs().len(), 3);
    }

    #[test]
    fn test_out_of_order_input_is_rejected() {
        let sim = simulator();
        let mut node = SourceRockNode::new(10.0, 5.0, 2700.0, 2500.0, 0, 0);
        node.add_input(SourceRockNodeInput::new(100.0, 20.0, 1.0e7));
        node.add_input(SourceRockNodeInput::new(90.0, 40.0, 2.0e7));
        node.request_computation(&sim).unwrap();

        let mut stale = SourceRockNodeInput::new(80.0, 50.0, 2.0e7);
        stale.previous_time = Some(95.0);
        node.add_input(stale);
        let err = node.request_computation(&sim).unwrap_err();
        assert!(matches!(err, GenexError::Sequencing(SequencingError::OutOfOrder { .. })));
    }

    #[test]
    fn test_1d_run_records_one_output_per_snapshot() {
        let sim = simulator();
        let mut node = SourceRockNode::new(10.0, 5.0, 2700.0, 2500.0, 0, 0);
        node.add_history_collector(Box::new(StepCounter { times: Vec::new() }));
        let snapshots = vec![
            SourceRockNodeInput::new(100.0, 10.0, 5.0e6),
            SourceRockNodeInput::new(50.0, 80.0, 2.0e7),
            SourceRockNodeInput::new(0.0, 150.0, 4.0e7),
        ];
        node.request_computation_1d(&sim, &snapshots, 100.0).unwrap();

        assert_eq!(node.outputs().len(), 3);
        assert_eq!(node.outputs()[2].current_time, 0.0);
        assert_eq!(node.state().unwrap().reference_time(), 0.0);

        // 0.25 Ma steps: 200 sub-steps per 50 Ma interval
        let counter = node
            .history_collector("StepCounter")
            .and_then(|c| c.as_any().downcast_ref::<StepCounter>())
            .unwrap();
        assert_eq!(counter.times.len(), 400);
    }
}
