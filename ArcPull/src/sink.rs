//! Per-call extraction sink
//!
//! [`ExtractionSink`] is the callback surface handed to an engine for a
//! single-index extraction. It gives the engine the caller's destination,
//! turns the engine's cumulative completed-size ticks into per-tick byte
//! counts, and reports them to an optional progress callback.

use std::io::Write;
use std::ops::ControlFlow;

use crate::engine::{AskMode, ExtractCallback, OperationResult};
use crate::error::{Error, Result};

/// One progress notification for an entry extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionProgress {
    /// Index of the entry being extracted
    pub index: u32,
    /// Bytes delivered since the previous notification
    pub bytes_delivered: u64,
    /// Completion so far, 0-100
    pub percent_complete: u8,
}

/// Progress callback for entry extraction.
///
/// Returning [`ControlFlow::Break`] stops the extraction; the call then fails
/// with [`Error::Cancelled`].
///
/// # Example
/// ```
/// use std::ops::ControlFlow;
/// use arcpull::ExtractionProgress;
///
/// let mut written = 0u64;
/// let mut on_progress = |p: &ExtractionProgress| -> ControlFlow<()> {
///     written += p.bytes_delivered;
///     ControlFlow::Continue(())
/// };
/// # let _ = &mut on_progress;
/// ```
pub type ProgressCallback<'p> = &'p mut dyn FnMut(&ExtractionProgress) -> ControlFlow<()>;

/// Callback surface for extracting exactly one archive index.
///
/// Built fresh for every extraction call and never reused. After the engine
/// returns, [`finalize`](Self::finalize) must run so the caller sees a
/// terminal 100% notification even when the engine's own ticks fell short.
pub struct ExtractionSink<'a, 'p> {
    index: u32,
    destination: Option<&'a mut dyn Write>,
    password: Option<&'a str>,
    on_progress: Option<ProgressCallback<'p>>,
    /// Running total of bytes reported to the caller
    delivered: u64,
    /// Highest completed-size value the engine has reported
    last_completed: u64,
    total: Option<u64>,
    result: Option<OperationResult>,
    reported_complete: bool,
    cancelled: bool,
}

impl<'a, 'p> ExtractionSink<'a, 'p> {
    /// Create a sink bound to `index` that writes into `destination`.
    pub fn new(
        index: u32,
        destination: &'a mut dyn Write,
        on_progress: Option<ProgressCallback<'p>>,
    ) -> Self {
        Self {
            index,
            destination: Some(destination),
            password: None,
            on_progress,
            delivered: 0,
            last_completed: 0,
            total: None,
            result: None,
            reported_complete: false,
            cancelled: false,
        }
    }

    /// Offer `password` to the engine for this extraction.
    #[must_use]
    pub fn with_password(mut self, password: Option<&'a str>) -> Self {
        self.password = password;
        self
    }

    /// Index this sink accepts streams for.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Bytes reported to the caller so far.
    #[must_use]
    pub fn bytes_delivered(&self) -> u64 {
        self.delivered
    }

    /// Total size last reported by the engine.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Outcome the engine reported for the bound index, if any.
    #[must_use]
    pub fn operation_result(&self) -> Option<OperationResult> {
        self.result
    }

    /// True once the progress callback has asked to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Completion percentage against the cached total.
    fn percent_complete(&self) -> u8 {
        match self.total {
            None => 0,
            Some(0) => 100,
            Some(total) => {
                let percent = u128::from(self.delivered) * 100 / u128::from(total);
                percent.min(100) as u8
            }
        }
    }

    fn notify(&mut self, bytes_delivered: u64) -> Result<()> {
        let percent_complete = self.percent_complete();
        if percent_complete == 100 {
            self.reported_complete = true;
        }

        let Some(on_progress) = self.on_progress.as_mut() else {
            return Ok(());
        };

        let progress = ExtractionProgress {
            index: self.index,
            bytes_delivered,
            percent_complete,
        };
        if on_progress(&progress).is_break() {
            self.cancelled = true;
            return Err(Error::Cancelled { index: self.index });
        }
        Ok(())
    }

    /// Emit the terminal 100% notification if it has not been seen yet.
    ///
    /// Covers whatever the engine's ticks left out, so the bytes reported
    /// across all notifications add up to the total size. Safe to call more
    /// than once; does nothing after the callback cancelled.
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] if the callback asks to stop on this
    /// last notification.
    pub fn finalize(&mut self) -> Result<()> {
        if self.cancelled {
            return Ok(());
        }

        let total = *self.total.get_or_insert(self.delivered);
        if self.delivered < total {
            let remaining = total - self.delivered;
            self.delivered = total;
            self.notify(remaining)
        } else if !self.reported_complete {
            self.notify(0)
        } else {
            Ok(())
        }
    }

    /// Turn a non-success outcome for the bound index into an error.
    ///
    /// # Errors
    /// Returns [`Error::OperationFailed`] carrying the reported outcome.
    pub fn check_result(&self) -> Result<()> {
        match self.result {
            Some(result) if !result.is_ok() => Err(Error::OperationFailed {
                index: self.index,
                result,
            }),
            _ => Ok(()),
        }
    }
}

impl<'a> ExtractCallback<'a> for ExtractionSink<'a, '_> {
    fn set_total(&mut self, total: u64) -> Result<()> {
        self.total = Some(total);
        Ok(())
    }

    fn set_completed(&mut self, completed: u64) -> Result<()> {
        // Duplicate and out-of-order ticks carry no new bytes
        if completed <= self.last_completed {
            return Ok(());
        }
        let delta = completed - self.last_completed;
        self.last_completed = completed;
        self.delivered += delta;
        self.notify(delta)
    }

    fn get_stream(&mut self, index: u32, mode: AskMode) -> Result<Option<&'a mut dyn Write>> {
        if index != self.index {
            tracing::warn!(
                "Engine asked for a stream for item {} while extracting item {}; refusing",
                index,
                self.index
            );
            return Ok(None);
        }
        if mode != AskMode::Extract {
            return Ok(None);
        }

        let stream = self.destination.take();
        if stream.is_none() {
            tracing::debug!("Destination for item {} was already handed out", index);
        }
        Ok(stream)
    }

    fn set_operation_result(&mut self, index: u32, result: OperationResult) -> Result<()> {
        if index != self.index {
            tracing::warn!(
                "Ignoring result '{}' for item {} while extracting item {}",
                result,
                index,
                self.index
            );
            return Ok(());
        }
        self.result = Some(result);
        Ok(())
    }

    fn password(&self) -> Option<&str> {
        self.password
    }
}
