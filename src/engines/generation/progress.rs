use log::info;
use std::sync::mpsc::Sender;

/// Training progress hooks, called by the learner between repetitions.
pub trait ProgressCallback: Send {
    fn on_repetition_start(&mut self, repetition: usize, total: usize);
    fn on_repetition_complete(&mut self, repetition: usize, summary: &RepetitionSummary);
}

/// Population state at the end of one pass over the training set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepetitionSummary {
    pub macroclassifiers: usize,
    pub numerosity: usize,
    pub mean_fitness: f64,
    pub covers: u64,
    pub ga_invocations: u64,
    /// Mean macroclassifier count of the last instance's label correct sets.
    pub mean_correct_set_size: usize,
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_repetition_start(&mut self, repetition: usize, total: usize) {
        info!("Repetition {}/{} starting", repetition + 1, total);
    }

    fn on_repetition_complete(&mut self, repetition: usize, summary: &RepetitionSummary) {
        info!(
            "Repetition {} complete. Rules: {} (numerosity {}), mean fitness: {:.4}, covers: {}, GA runs: {}",
            repetition + 1,
            summary.macroclassifiers,
            summary.numerosity,
            summary.mean_fitness,
            summary.covers,
            summary.ga_invocations
        );
    }
}

/// Discards all progress.
pub struct SilentProgressCallback;

impl ProgressCallback for SilentProgressCallback {
    fn on_repetition_start(&mut self, _repetition: usize, _total: usize) {}

    fn on_repetition_complete(&mut self, _repetition: usize, _summary: &RepetitionSummary) {}
}

// For a thread watching a long training run
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    RepetitionStart { repetition: usize, total: usize },
    RepetitionComplete { repetition: usize, summary: RepetitionSummary },
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_repetition_start(&mut self, repetition: usize, total: usize) {
        let _ = self.sender.send(ProgressMessage::RepetitionStart { repetition, total });
    }

    fn on_repetition_complete(&mut self, repetition: usize, summary: &RepetitionSummary) {
        let _ = self.sender.send(ProgressMessage::RepetitionComplete {
            repetition,
            summary: *summary,
        });
    }
}
