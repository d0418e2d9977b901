//! Spectrum engine thread: capture, FFT, band levels, smoothing, throttled
//! delivery.
//!
//! The engine runs on a plain OS thread because cpal streams are not `Send`;
//! the stream is created inside the thread and never leaves it. Stop is a
//! shared flag polled every loop iteration, so `stop()` returns within one
//! read-timeout interval.

use crate::bands::BandPartition;
use crate::capture::{CaptureStream, FALLBACK_CHAIN};
use crate::dsp::{downmix, normalize_db, Smoother, SpectrumAnalyzer};
use crate::simulate::SimulatedSpectrum;
use lyricbar_core::SpectrumConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const LOG_TARGET: &str = "lyricbar::engine";

/// Simulation frame pacing, matching its 0.05 s time step
const SIM_FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Receives each throttled frame of normalized bar levels
pub type LevelCallback = Box<dyn FnMut(&[f32]) + Send + 'static>;

pub struct SpectrumEngine {
    cfg: SpectrumConfig,
    num_bars: usize,
    stop: Arc<AtomicBool>,
    active: Option<Arc<AtomicBool>>,
    handle: Option<JoinHandle<()>>,
}

impl SpectrumEngine {
    #[must_use]
    pub fn new(cfg: SpectrumConfig, num_bars: usize) -> Self {
        Self {
            cfg,
            num_bars: num_bars.max(1),
            stop: Arc::new(AtomicBool::new(false)),
            active: None,
            handle: None,
        }
    }

    /// Share the scheduler's visualizer flag; the engine raises it while
    /// running and clears it on stop.
    pub fn bind_activity_flag(&mut self, flag: Arc<AtomicBool>) {
        self.active = Some(flag);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the engine thread. A second call while running is a no-op.
    pub fn start(&mut self, callback: LevelCallback) {
        if self.handle.is_some() {
            return;
        }
        self.stop.store(false, Ordering::Relaxed);
        if let Some(flag) = &self.active {
            flag.store(true, Ordering::Relaxed);
        }
        let cfg = self.cfg.clone();
        let num_bars = self.num_bars;
        let stop = Arc::clone(&self.stop);
        self.handle = Some(std::thread::spawn(move || {
            run_loop(&cfg, num_bars, &stop, callback);
        }));
        tracing::info!(target: LOG_TARGET, num_bars, "spectrum engine started");
    }

    /// Signal the thread and join it
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(flag) = &self.active {
            flag.store(false, Ordering::Relaxed);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(target: LOG_TARGET, "engine thread panicked");
            }
            tracing::info!(target: LOG_TARGET, "spectrum engine stopped");
        }
    }
}

impl Drop for SpectrumEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Per-mode processing state. Device mode owns the stream; it is built here,
/// inside the engine thread, and dropped on every mode exit.
enum Mode {
    Device {
        capture: CaptureStream,
        analyzer: SpectrumAnalyzer,
        partition: BandPartition,
        pending: Vec<f32>,
        failures: u32,
    },
    Simulation(SimulatedSpectrum),
}

fn acquire_mode(cfg: &SpectrumConfig, num_bars: usize) -> Mode {
    match CaptureStream::acquire(&FALLBACK_CHAIN) {
        Ok(capture) => {
            let partition = BandPartition::new(
                num_bars,
                cfg.chunk_size,
                f64::from(capture.sample_rate),
                cfg.freq_min_hz,
                cfg.freq_max_hz,
            );
            Mode::Device {
                capture,
                analyzer: SpectrumAnalyzer::new(cfg.chunk_size),
                partition,
                pending: Vec::with_capacity(cfg.chunk_size * 2),
                failures: 0,
            }
        }
        Err(e) => {
            tracing::warn!(target: LOG_TARGET, error = %e, "no capture device, using simulation");
            Mode::Simulation(SimulatedSpectrum::new(num_bars, 0x5eed))
        }
    }
}

/// Outcome of one loop iteration
enum Step {
    Frame(Vec<f32>),
    Idle,
    /// The stream stalled or closed; rebuild mode from the fallback chain
    Reacquire,
}

fn run_loop(cfg: &SpectrumConfig, num_bars: usize, stop: &AtomicBool, mut callback: LevelCallback) {
    let mut mode = acquire_mode(cfg, num_bars);
    let mut smoother = Smoother::new(cfg.smooth_alpha, cfg.peak_decay, num_bars);
    let throttle = cfg.throttle_interval();
    let mut last_emit: Option<Instant> = None;

    while !stop.load(Ordering::Relaxed) {
        let step = match &mut mode {
            Mode::Device {
                capture,
                analyzer,
                partition,
                pending,
                failures,
            } => match capture.samples.recv_timeout(cfg.read_timeout()) {
                Ok(block) => {
                    *failures = 0;
                    pending.extend(downmix(&block, capture.channels));
                    let mut latest = None;
                    while pending.len() >= cfg.chunk_size {
                        let chunk: Vec<f32> = pending.drain(..cfg.chunk_size).collect();
                        let db = analyzer.magnitudes_db(&chunk);
                        let levels: Vec<f32> = partition
                            .band_levels_db(&db)
                            .into_iter()
                            .map(|v| normalize_db(v, cfg.min_db, cfg.max_db))
                            .collect();
                        latest = Some(levels);
                    }
                    latest.map_or(Step::Idle, Step::Frame)
                }
                Err(RecvTimeoutError::Timeout) => {
                    *failures += 1;
                    if *failures > cfg.max_read_failures {
                        tracing::warn!(
                            target: LOG_TARGET,
                            failures = *failures,
                            "capture stalled, re-entering device fallback"
                        );
                        Step::Reacquire
                    } else {
                        Step::Idle
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!(target: LOG_TARGET, "capture stream closed, re-entering device fallback");
                    Step::Reacquire
                }
            },
            Mode::Simulation(sim) => {
                std::thread::sleep(SIM_FRAME_INTERVAL);
                Step::Frame(sim.next_frame())
            }
        };

        match step {
            Step::Frame(frame) => {
                let levels = smoother.apply(&frame);
                let due = last_emit.map_or(true, |t| t.elapsed() >= throttle);
                if due {
                    last_emit = Some(Instant::now());
                    callback(levels);
                }
            }
            Step::Idle => {}
            Step::Reacquire => {
                // Old stream drops here before a new one is opened
                mode = acquire_mode(cfg, num_bars);
                smoother.reset();
            }
        }
    }
}
