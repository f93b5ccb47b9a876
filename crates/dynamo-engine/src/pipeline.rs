//! The per-cycle diagnostic aggregation pipeline.
//!
//! [`DiagnosticPipeline`] runs one rank's side of every diagnostic cycle:
//!
//! 1. **Reset**: zero the local record.
//! 2. **LocalFill**: run each producer once over the owned shells, on
//!    the rank's rayon pool.
//! 3. **Reduce**: elementwise sum across the process group.
//! 4. **Append**: the root writes one log line; other ranks keep the
//!    reduced record but never write.
//!
//! # Failure containment
//!
//! The reduction is a blocking collective: a rank that skips it stalls
//! the group. A producer error therefore never returns early. The
//! pipeline appends one hidden status element, the local failure count,
//! to the reduction buffer, so every rank still contributes and then
//! learns whether any peer failed. If one did, every rank returns
//! [`CycleError::FillFailed`] for that cycle and nothing is written.
//!
//! # Ownership model
//!
//! `DiagnosticPipeline` is [`Send`] (it moves onto its rank's thread)
//! and all cycle methods take `&mut self`.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use dynamo_comm::{CommError, Communicator};
use dynamo_core::{CycleId, RadialGrid, Rank, ShellData};
use dynamo_diag::{
    DiagnosticError, DiagnosticProducer, DiagnosticRecord, DiagnosticRegistry, DiagnosticSchema,
    FillContext, SlotDef, SlotWriter,
};
use dynamo_radial::{ProfileError, RadialOwnership};
use log::{debug, error, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{ConfigError, RunConfig};
use crate::metrics::CycleMetrics;
use crate::setup::SolverCoefficients;
use crate::writer::DiagnosticLog;

// Compile-time assertion: the pipeline can be moved onto a rank thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<DiagnosticPipeline<dynamo_comm::LocalComm>>();
        assert_send::<DiagnosticPipeline<Box<dyn Communicator>>>();
    }
};

/// Log sink type held by the root rank.
pub type LogSink = Box<dyn Write + Send>;

// ── CyclePhase ──────────────────────────────────────────────────

/// Where the pipeline is within a cycle.
///
/// After a successful cycle the phase is [`Complete`](Self::Complete).
/// After a failed one it stays at the phase that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CyclePhase {
    /// Zeroing the local record.
    Reset,
    /// Running producers over owned shells.
    LocalFill,
    /// Summing records across the group.
    Reduce,
    /// Writing the log line on the root.
    Append,
    /// Cycle finished.
    Complete,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Reset => "reset",
            Self::LocalFill => "local fill",
            Self::Reduce => "reduce",
            Self::Append => "append",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

// ── CycleError ──────────────────────────────────────────────────

/// Errors from [`DiagnosticPipeline::run_cycle`].
#[derive(Debug)]
pub enum CycleError {
    /// The collective reduction failed.
    Comm(CommError),
    /// At least one producer failed on at least one rank. Every rank
    /// returns this for the same cycle.
    FillFailed {
        /// Failures summed over the group.
        failures: u64,
        /// This rank's first failure, if it had one.
        local: Option<DiagnosticError>,
    },
    /// The root could not append to the log.
    Log(io::Error),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comm(e) => write!(f, "reduction failed: {e}"),
            Self::FillFailed {
                failures,
                local: Some(e),
            } => write!(f, "{failures} producer failure(s) in the group; here: {e}"),
            Self::FillFailed {
                failures,
                local: None,
            } => write!(f, "{failures} producer failure(s) on other ranks"),
            Self::Log(e) => write!(f, "diagnostic log: {e}"),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Comm(e) => Some(e),
            Self::FillFailed { local: Some(e), .. } => Some(e),
            Self::FillFailed { local: None, .. } => None,
            Self::Log(e) => Some(e),
        }
    }
}

impl From<CommError> for CycleError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}

// ── CycleReport ─────────────────────────────────────────────────

/// Result of a successful cycle.
#[derive(Clone, Debug)]
pub struct CycleReport {
    /// Which cycle this was (0-based).
    pub cycle: CycleId,
    /// Simulation time passed to [`DiagnosticPipeline::run_cycle`].
    pub time: f64,
    /// The fully reduced record, identical on every rank.
    pub record: DiagnosticRecord,
    /// Whether this rank appended a log line.
    pub appended: bool,
    /// Timing for this cycle.
    pub metrics: CycleMetrics,
}

// ── DiagnosticPipeline ──────────────────────────────────────────

/// One rank's diagnostic aggregation pipeline.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dynamo_comm::SingleProcess;
/// use dynamo_core::{ParameterSet, RadialGrid, ShellData};
/// use dynamo_diag::{DiagnosticRegistry, ProducerSpec};
/// use dynamo_engine::{DiagnosticPipeline, RunConfig, SolverCoefficients};
///
/// struct Flat;
/// impl ShellData for Flat {
///     fn shell_count(&self) -> usize { 8 }
///     fn quantity(&self, _: &str) -> Option<&[f64]> { None }
/// }
///
/// let mut cfg = RunConfig::new(RadialGrid::new(8, 5).unwrap());
/// cfg.diagnostics = vec![ProducerSpec::new("shell_count")];
/// let coeffs = Arc::new(SolverCoefficients::build(&cfg, &ParameterSet::new(), None).unwrap());
/// let registry = DiagnosticRegistry::with_builtins();
/// let mut pipeline = DiagnosticPipeline::new(SingleProcess, &cfg, coeffs, &registry).unwrap();
/// let report = pipeline.run_cycle(0.0, &Flat).unwrap();
/// assert_eq!(report.record.value("count"), Some(8.0));
/// ```
pub struct DiagnosticPipeline<C: Communicator> {
    comm: C,
    ownership: RadialOwnership,
    coefficients: Arc<SolverCoefficients>,
    producers: Vec<Box<dyn DiagnosticProducer>>,
    /// `declared[i]` is the slot list of `producers[i]`.
    declared: Vec<Vec<SlotDef>>,
    schema: Arc<DiagnosticSchema>,
    record: DiagnosticRecord,
    /// Record values plus the trailing failure count.
    reduce_buf: Vec<f64>,
    pool: ThreadPool,
    log: Option<DiagnosticLog<LogSink>>,
    log_header: bool,
    next_cycle: CycleId,
    phase: CyclePhase,
}

impl<C: Communicator> DiagnosticPipeline<C> {
    /// Build the pipeline for `comm`'s rank, creating the producers
    /// named in `config.diagnostics` from `registry`.
    ///
    /// This is a collective call: every rank must construct its
    /// pipeline, because construction ends with a handshake that checks
    /// all ranks agree on the grid and the diagnostic layout. A rank
    /// that fails locally still joins the handshake, so its peers fail
    /// with [`ConfigError::PeerFailed`] instead of waiting for it.
    pub fn new(
        comm: C,
        config: &RunConfig,
        coefficients: Arc<SolverCoefficients>,
        registry: &DiagnosticRegistry,
    ) -> Result<Self, ConfigError> {
        let producers = registry
            .build_all(&config.diagnostics)
            .map_err(ConfigError::from);
        Self::assemble(comm, config, coefficients, producers)
    }

    /// Build the pipeline with an explicit producer list, ignoring
    /// `config.diagnostics`. Collective, like [`new`](Self::new).
    pub fn with_producers(
        comm: C,
        config: &RunConfig,
        coefficients: Arc<SolverCoefficients>,
        producers: Vec<Box<dyn DiagnosticProducer>>,
    ) -> Result<Self, ConfigError> {
        Self::assemble(comm, config, coefficients, Ok(producers))
    }

    fn assemble(
        mut comm: C,
        config: &RunConfig,
        coefficients: Arc<SolverCoefficients>,
        producers: Result<Vec<Box<dyn DiagnosticProducer>>, ConfigError>,
    ) -> Result<Self, ConfigError> {
        let local = producers.and_then(|producers| {
            let parts = prepare(&comm, config, &coefficients, &producers)?;
            Ok((producers, parts))
        });
        if let Err(e) = &local {
            error!("rank {}: pipeline construction failed: {e}", comm.rank());
        }
        let fingerprint = local
            .as_ref()
            .map_or(0, |(_, parts)| parts.schema.fingerprint());
        let agreed = handshake(&mut comm, local.is_err(), fingerprint, config.grid);
        // A local error outranks whatever the group reported.
        let (producers, parts) = local?;
        agreed?;

        let Parts {
            ownership,
            declared,
            schema,
            pool,
        } = parts;
        let range = ownership.local_range();
        info!(
            "rank {}/{}: shells {}..{}, {} producer(s), {} slot(s), {} value(s), {} fill thread(s)",
            comm.rank(),
            comm.size(),
            range.start,
            range.end,
            producers.len(),
            schema.slot_count(),
            schema.len(),
            pool.current_num_threads(),
        );

        let record = DiagnosticRecord::new(schema.clone());
        let reduce_buf = vec![0.0; schema.len() + 1];
        Ok(Self {
            comm,
            ownership,
            coefficients,
            producers,
            declared,
            schema,
            record,
            reduce_buf,
            pool,
            log: None,
            log_header: config.log_header,
            next_cycle: CycleId(0),
            phase: CyclePhase::Complete,
        })
    }

    /// Give the pipeline a fresh log sink.
    ///
    /// Only the root keeps it; on every other rank the sink is dropped
    /// unused and `Ok(false)` is returned, so all ranks can run the same
    /// setup code. Writes the header first if the configuration asks
    /// for one, so `sink` must start empty; use
    /// [`attach_log_file`](Self::attach_log_file) to continue an
    /// existing log.
    pub fn attach_log<W: Write + Send + 'static>(&mut self, sink: W) -> io::Result<bool> {
        if !self.comm.is_root() {
            return Ok(false);
        }
        let sink: LogSink = Box::new(sink);
        let log = if self.log_header {
            DiagnosticLog::with_header(sink, &self.schema)?
        } else {
            DiagnosticLog::new(sink)
        };
        self.log = Some(log);
        Ok(true)
    }

    /// Open `path` for appending on the root and log there.
    ///
    /// Existing lines are kept and the header is written only when the
    /// file is empty, so a restarted run continues the same log. Other
    /// ranks never touch the file and get `Ok(false)`.
    pub fn attach_log_file(&mut self, path: impl AsRef<Path>) -> io::Result<bool> {
        if !self.comm.is_root() {
            return Ok(false);
        }
        let log = if self.log_header {
            DiagnosticLog::append_with_header(path, &self.schema)?
        } else {
            DiagnosticLog::append(path)?
        };
        self.log = Some(log.boxed());
        Ok(true)
    }

    /// Run one full cycle at simulation time `time`.
    ///
    /// Collective: every rank must call this the same number of times.
    /// Every rank returns the same outcome for the same cycle, except
    /// that only the root can see [`CycleError::Log`].
    pub fn run_cycle(&mut self, time: f64, shells: &dyn ShellData) -> Result<CycleReport, CycleError> {
        let cycle = self.next_cycle;
        self.next_cycle = CycleId(cycle.0 + 1);
        let cycle_start = Instant::now();
        let mut metrics = CycleMetrics::default();

        // 1. Reset.
        self.phase = CyclePhase::Reset;
        self.record.reset();

        // 2. Local fill. Errors are recorded, never returned here.
        self.phase = CyclePhase::LocalFill;
        let fill_start = Instant::now();
        let mut local_error = None;
        let expected = self.ownership.grid().shell_count();
        if shells.shell_count() != expected {
            local_error = Some(DiagnosticError::QuantityLength {
                name: "shell data".to_string(),
                expected,
                found: shells.shell_count(),
            });
        } else {
            let ctx = FillContext::new(
                &self.ownership,
                self.coefficients.diffusivity(),
                shells,
                &self.pool,
                cycle,
                time,
            );
            for (producer, slots) in self.producers.iter().zip(&self.declared) {
                let start = Instant::now();
                let mut out = SlotWriter::new(&mut self.record, producer.name(), slots);
                let result = producer.fill(&ctx, &mut out);
                metrics
                    .producer_us
                    .push((producer.name().to_string(), start.elapsed().as_micros() as u64));
                if let Err(e) = result {
                    local_error = Some(e);
                    break;
                }
            }
        }
        if let Some(e) = &local_error {
            warn!(
                "rank {} cycle {cycle}: local fill failed: {e}",
                self.comm.rank()
            );
            metrics.local_failures = 1;
        }
        metrics.fill_us = fill_start.elapsed().as_micros() as u64;

        // 3. Reduce. Every rank gets here, failed or not.
        self.phase = CyclePhase::Reduce;
        let reduce_start = Instant::now();
        let n = self.schema.len();
        self.reduce_buf[..n].copy_from_slice(self.record.as_slice());
        self.reduce_buf[n] = metrics.local_failures as f64;
        if let Err(e) = self.comm.all_reduce_sum(&mut self.reduce_buf) {
            error!("rank {} cycle {cycle}: reduction failed: {e}", self.comm.rank());
            return Err(CycleError::Comm(e));
        }
        metrics.reduce_us = reduce_start.elapsed().as_micros() as u64;
        let failures = self.reduce_buf[n] as u64;
        if failures > 0 {
            self.record.reset();
            error!(
                "rank {} cycle {cycle}: abandoned after {failures} producer failure(s)",
                self.comm.rank()
            );
            return Err(CycleError::FillFailed {
                failures,
                local: local_error,
            });
        }
        self.record
            .as_mut_slice()
            .copy_from_slice(&self.reduce_buf[..n]);

        // 4. Append, root only.
        self.phase = CyclePhase::Append;
        let append_start = Instant::now();
        let appended = match &mut self.log {
            Some(log) => {
                log.append_line(time, self.record.as_slice())
                    .map_err(CycleError::Log)?;
                true
            }
            None => false,
        };
        metrics.append_us = append_start.elapsed().as_micros() as u64;

        self.phase = CyclePhase::Complete;
        metrics.total_us = cycle_start.elapsed().as_micros() as u64;
        debug!(
            "rank {} cycle {cycle} t={time}: fill {}us reduce {}us append {}us",
            self.comm.rank(),
            metrics.fill_us,
            metrics.reduce_us,
            metrics.append_us,
        );

        Ok(CycleReport {
            cycle,
            time,
            record: self.record.clone(),
            appended,
            metrics,
        })
    }

    /// This rank.
    pub fn rank(&self) -> Rank {
        self.comm.rank()
    }

    /// Number of ranks in the group.
    pub fn group_size(&self) -> usize {
        self.comm.size()
    }

    /// This rank's ownership map.
    pub fn ownership(&self) -> &RadialOwnership {
        &self.ownership
    }

    /// The radial grid.
    pub fn grid(&self) -> RadialGrid {
        self.ownership.grid()
    }

    /// Coefficients shared with the solver.
    pub fn coefficients(&self) -> &Arc<SolverCoefficients> {
        &self.coefficients
    }

    /// The slot layout of every record.
    pub fn schema(&self) -> &Arc<DiagnosticSchema> {
        &self.schema
    }

    /// The most recent record: reduced after a successful cycle, zeroed
    /// after a failed fill.
    pub fn record(&self) -> &DiagnosticRecord {
        &self.record
    }

    /// Phase reached by the most recent cycle.
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// The id the next cycle will get.
    pub fn next_cycle(&self) -> CycleId {
        self.next_cycle
    }

    /// Whether this rank holds a log sink.
    pub fn has_log(&self) -> bool {
        self.log.is_some()
    }

    /// Lines this rank has appended to its log.
    pub fn lines_written(&self) -> u64 {
        self.log.as_ref().map_or(0, DiagnosticLog::lines_written)
    }

    /// Flush the log, if any.
    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.log {
            Some(log) => log.flush(),
            None => Ok(()),
        }
    }

    /// Tear down the pipeline and return the communicator.
    pub fn into_comm(self) -> C {
        self.comm
    }
}

impl<C: Communicator> fmt::Debug for DiagnosticPipeline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticPipeline")
            .field("rank", &self.comm.rank())
            .field("size", &self.comm.size())
            .field("local_shells", &self.ownership.local_range())
            .field("producers", &self.producers.len())
            .field("slots", &self.schema.slot_count())
            .field("next_cycle", &self.next_cycle)
            .field("phase", &self.phase)
            .field("has_log", &self.log.is_some())
            .finish()
    }
}

// ── Construction ────────────────────────────────────────────────

/// Everything a rank builds on its own before the handshake.
struct Parts {
    ownership: RadialOwnership,
    declared: Vec<Vec<SlotDef>>,
    schema: Arc<DiagnosticSchema>,
    pool: ThreadPool,
}

fn prepare<C: Communicator>(
    comm: &C,
    config: &RunConfig,
    coefficients: &SolverCoefficients,
    producers: &[Box<dyn DiagnosticProducer>],
) -> Result<Parts, ConfigError> {
    config.validate()?;
    let grid = config.grid;
    if coefficients.diffusivity().len() != grid.shell_count() {
        return Err(ProfileError::LengthMismatch {
            expected: grid.shell_count(),
            found: coefficients.diffusivity().len(),
        }
        .into());
    }
    let ownership = RadialOwnership::new(grid, comm.size(), comm.rank())?;

    let declared: Vec<Vec<SlotDef>> = producers.iter().map(|p| p.slots()).collect();
    let schema = Arc::new(
        DiagnosticSchema::builder()
            .extend(declared.iter().flatten().cloned())
            .build()?,
    );

    let rank = comm.rank();
    let mut builder =
        ThreadPoolBuilder::new().thread_name(move |i| format!("dynamo-fill-{rank}-{i}"));
    if let Some(n) = config.resolved_fill_threads() {
        builder = builder.num_threads(n);
    }
    let pool = builder.build().map_err(|e| ConfigError::ThreadPool {
        reason: e.to_string(),
    })?;

    Ok(Parts {
        ownership,
        declared,
        schema,
        pool,
    })
}

// ── Startup handshake ───────────────────────────────────────────

/// Check that every rank built its side and has the same grid and
/// schema.
///
/// Round one sums each rank's failure flag and values. Any failure ends
/// the handshake there on every rank. Otherwise a rank whose value
/// differs from the mean flags itself, and round two sums the flags, so
/// if any rank disagrees every rank fails, including those that happen
/// to equal the mean.
fn handshake<C: Communicator>(
    comm: &mut C,
    failed: bool,
    fp: u64,
    grid: RadialGrid,
) -> Result<(), ConfigError> {
    // 32-bit halves and small integers stay exact in f64 sums.
    let local = [
        f64::from(u8::from(failed)),
        (fp >> 32) as f64,
        (fp & 0xffff_ffff) as f64,
        grid.shell_count() as f64,
        grid.boundary() as f64,
    ];
    let mut sums = local;
    comm.all_reduce_sum(&mut sums)?;
    if sums[0] > 0.0 {
        let failures = sums[0] as u64;
        if !failed {
            error!(
                "rank {}: {failures} other rank(s) failed to build their pipeline",
                comm.rank()
            );
        }
        return Err(ConfigError::PeerFailed { failures });
    }
    let n = comm.size() as f64;
    let differs = |i: usize| sums[i] != n * local[i];

    let mut flags = [
        f64::from(u8::from(differs(1) || differs(2))),
        f64::from(u8::from(differs(3) || differs(4))),
    ];
    comm.all_reduce_sum(&mut flags)?;

    if flags[0] > 0.0 {
        error!(
            "rank {}: diagnostic schema {fp:#018x} does not match the group",
            comm.rank()
        );
        return Err(ConfigError::SchemaMismatch { fingerprint: fp });
    }
    if flags[1] > 0.0 {
        error!(
            "rank {}: grid NR={} NM={} does not match the group",
            comm.rank(),
            grid.shell_count(),
            grid.boundary()
        );
        return Err(ConfigError::GridMismatch {
            shell_count: grid.shell_count(),
            boundary: grid.boundary(),
        });
    }
    Ok(())
}
