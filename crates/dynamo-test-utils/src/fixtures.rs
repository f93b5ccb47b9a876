//! Reusable producer fixtures and a shared log sink.
//!
//! - [`RankValueProducer`]: writes the rank index into one slot.
//! - [`FailingProducer`]: fails deterministically after N calls.
//! - [`SharedBuffer`]: a cloneable `Write` sink for inspecting logs.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dynamo_diag::{DiagnosticError, DiagnosticProducer, FillContext, SlotDef, SlotWriter};

/// Adds this rank's index to every component of one slot.
///
/// Across `P` ranks the reduced value is `P(P-1)/2`.
pub struct RankValueProducer {
    pub slot: String,
    pub arity: usize,
}

impl RankValueProducer {
    pub fn new(slot: impl Into<String>, arity: usize) -> Self {
        Self {
            slot: slot.into(),
            arity,
        }
    }
}

impl DiagnosticProducer for RankValueProducer {
    fn name(&self) -> &str {
        "rank_value"
    }

    fn slots(&self) -> Vec<SlotDef> {
        vec![SlotDef::new(self.slot.clone(), self.arity)]
    }

    fn fill(&self, ctx: &FillContext<'_>, out: &mut SlotWriter<'_>) -> Result<(), DiagnosticError> {
        let rank = ctx.ownership().rank().0 as f64;
        for i in 0..self.arity {
            out.add_at(&self.slot, i, rank)?;
        }
        Ok(())
    }
}

/// Fails deterministically after a configurable number of successful
/// calls, writing nothing when it fails.
///
/// Uses `AtomicUsize` for the call counter so it satisfies `Sync`.
pub struct FailingProducer {
    pub name: String,
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingProducer {
    /// A producer that succeeds `succeed_count` times then fails.
    pub fn new(name: impl Into<String>, succeed_count: usize) -> Self {
        Self {
            name: name.into(),
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `fill()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl DiagnosticProducer for FailingProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn slots(&self) -> Vec<SlotDef> {
        Vec::new()
    }

    fn fill(&self, _ctx: &FillContext<'_>, _out: &mut SlotWriter<'_>) -> Result<(), DiagnosticError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(DiagnosticError::ProducerFailed {
                producer: self.name.clone(),
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        Ok(())
    }
}

/// A `Write` sink whose clones share one buffer.
///
/// Hand one clone to the pipeline and keep another to read back what
/// was logged.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as UTF-8.
    pub fn text(&self) -> String {
        let bytes = self.inner.lock().unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("shared buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
