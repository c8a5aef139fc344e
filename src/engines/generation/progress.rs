use super::evolution_engine::{Phase, ProgressCallback};

/// Reports progress of one simulation through the `log` facade.
pub struct LogProgressCallback {
    simulation: usize,
}

impl LogProgressCallback {
    pub fn new(simulation: usize) -> Self {
        Self { simulation }
    }
}

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        log::debug!("Simulation {}: generation {} starting", self.simulation, generation + 1);
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, worst_elite_fitness: f64, phase: Phase) {
        log::info!(
            "Simulation {}: generation {} complete. Best fitness: {:.4}, worst elite: {:.4} ({:?})",
            self.simulation,
            generation + 1,
            best_fitness,
            worst_elite_fitness,
            phase
        );
    }

    fn on_model_evaluated(&mut self, model_num: usize, total: usize) {
        if model_num % 10 == 0 || model_num == total {
            log::trace!("Simulation {}: evaluated {}/{} models", self.simulation, model_num, total);
        }
    }
}

/// Discards all progress events.
pub struct SilentProgressCallback;

impl ProgressCallback for SilentProgressCallback {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_generation_complete(&mut self, _generation: usize, _best: f64, _worst_elite: f64, _phase: Phase) {}

    fn on_model_evaluated(&mut self, _model_num: usize, _total: usize) {}
}
