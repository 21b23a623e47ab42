use crate::detector::AggressorDetector;
use crate::memory::{DRAMAddr, DramGeometry};
use crate::mitigation::{MitigationError, MitigationInjector};
use crate::trace::{TraceEnd, TraceReader};
use crate::util::{NamedProgress, PROGRESS_INTERVAL};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while augmenting a trace.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Opening the input or writing the output failed.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// Neighbor activations could not be synthesized.
    #[error(transparent)]
    MitigationError(#[from] MitigationError),
}

/// An address flagged as aggressor for the first time.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Aggressor {
    /// Linear address of the triggering access
    pub address: u64,
    /// Decoded DRAM address
    pub dram_addr: DRAMAddr,
    /// Cycle of the first trigger
    pub cycle: u64,
}

/// Summary of one pass over a trace.
#[derive(Debug, Serialize, Clone)]
pub struct PipelineReport {
    /// ISO 8601 timestamp of when the pass ran
    pub date: String,
    /// Name of the detection policy
    pub detector: &'static str,
    /// Records copied from the input trace
    pub records: u64,
    /// Accesses that triggered a mitigation
    pub mitigations: u64,
    /// Neighbor activations written
    pub injected: u64,
    /// Newly found aggressors in discovery order (row tracking detectors only)
    pub aggressors: Vec<Aggressor>,
    /// Why reading the input stopped
    pub end: TraceEnd,
}

impl PipelineReport {
    fn new(detector: &'static str) -> Self {
        Self {
            date: chrono::Local::now().to_rfc3339(),
            detector,
            records: 0,
            mitigations: 0,
            injected: 0,
            aggressors: vec![],
            end: TraceEnd::Exhausted,
        }
    }
}

/// Returns the path of the augmented trace for `trace`: `<trace>_<method>_applied`.
pub fn applied_trace_path(trace: &Path, method: &str) -> PathBuf {
    let mut name = trace.as_os_str().to_os_string();
    name.push(format!("_{method}_applied"));
    PathBuf::from(name)
}

/// Rewrites a trace, inserting neighbor row activations after every access the
/// detector flags.
///
/// Every input record is copied unchanged, followed by the activations it
/// triggered. The pipeline owns its detector; the detector state carries over
/// between records and is never reset.
pub struct Pipeline<D: AggressorDetector> {
    geometry: DramGeometry,
    detector: D,
    reported: HashSet<u64>,
    progress: Option<MultiProgress>,
}

impl<D: AggressorDetector> Pipeline<D> {
    /// Creates a pipeline decoding addresses with `geometry`.
    pub fn new(geometry: DramGeometry, detector: D) -> Self {
        Pipeline {
            geometry,
            detector,
            reported: HashSet::new(),
            progress: None,
        }
    }

    /// Shows a spinner on `progress` while processing.
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Augments the trace read from `input` and writes it to `output`.
    ///
    /// Processing stops at the end of `input` or at the first malformed line;
    /// both count as a regular end of the trace; the report records which one
    /// happened.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `output` fails or a triggering access is
    /// too close to the end of the cycle range to append its activations.
    pub fn process<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> Result<PipelineReport, PipelineError> {
        let bar = self.progress.as_ref().map(|p| {
            p.add(
                ProgressBar::new_spinner()
                    .with_style(ProgressStyle::named_spinner(self.detector.name())),
            )
        });
        let injector = MitigationInjector::new(&self.geometry);
        let mut reader = TraceReader::new(input);
        let mut report = PipelineReport::new(self.detector.name());

        for line in reader.by_ref() {
            writeln!(output, "{}", line)?;
            report.records += 1;

            let record = line.record;
            let addr = DRAMAddr::from_linear(record.address, &self.geometry);
            self.detector.update(&addr);
            if self.detector.should_mitigate() {
                report.mitigations += 1;
                for activation in injector.neighbor_activations(&addr, record.cycle)? {
                    writeln!(output, "{}", activation)?;
                    report.injected += 1;
                }
                if self.detector.tracks_rows() && self.reported.insert(record.address) {
                    info!(
                        "New aggressor 0x{:x} {} at cycle {}",
                        record.address, addr, record.cycle
                    );
                    report.aggressors.push(Aggressor {
                        address: record.address,
                        dram_addr: addr,
                        cycle: record.cycle,
                    });
                }
            }

            if report.records % PROGRESS_INTERVAL == 0 {
                if let Some(bar) = &bar {
                    bar.set_position(report.records);
                }
            }
        }
        output.flush()?;

        if let Some(end) = reader.end() {
            if *end != TraceEnd::Exhausted {
                warn!("Stopped reading trace: {}", end);
            }
            report.end = end.clone();
        }
        if let Some(bar) = bar {
            bar.set_position(report.records);
            bar.finish_with_message(format!("{} activations injected", report.injected));
        }
        debug!(
            "Processed {} records, {} mitigations",
            report.records, report.mitigations
        );
        Ok(report)
    }

    /// Augments the trace file at `trace`.
    ///
    /// The output is written to [`applied_trace_path`] for this detector. Both
    /// files are closed when this returns, whether it succeeds or not.
    ///
    /// # Returns
    ///
    /// The path of the augmented trace and the pass report.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be opened or written.
    pub fn convert_trace(
        &mut self,
        trace: &Path,
    ) -> Result<(PathBuf, PipelineReport), PipelineError> {
        let output_path = applied_trace_path(trace, self.detector.name());
        info!(
            "Generating {} from {}",
            output_path.display(),
            trace.display()
        );
        let input = BufReader::new(File::open(trace)?);
        let output = BufWriter::new(File::create(&output_path)?);
        let report = self.process(input, output)?;
        info!(
            "Wrote {} records and {} neighbor activations",
            report.records, report.injected
        );
        Ok((output_path, report))
    }
}
