use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::models::{AnalysisProgress, AnalysisStage};

/// Receives every snapshot of an analysis run, in emission order.
///
/// Delivery is fire-and-forget: implementations must not block the run and
/// have no way to report a failed delivery back.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, snapshot: &AnalysisProgress);
}

impl<S: ProgressSink + ?Sized> ProgressSink for std::sync::Arc<S> {
    fn on_progress(&self, snapshot: &AnalysisProgress) {
        (**self).on_progress(snapshot)
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Box<S> {
    fn on_progress(&self, snapshot: &AnalysisProgress) {
        (**self).on_progress(snapshot)
    }
}

/// Forwards snapshots to a tokio channel, e.g. for a UI task.
pub struct ChannelSink {
    sender: UnboundedSender<AnalysisProgress>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<AnalysisProgress>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelSink {
    fn on_progress(&self, snapshot: &AnalysisProgress) {
        if self.sender.send(snapshot.clone()).is_err() {
            debug!("Progress receiver dropped, discarding {} snapshot", snapshot.status);
        }
    }
}

/// Logs each snapshot.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn on_progress(&self, snapshot: &AnalysisProgress) {
        match snapshot.status {
            AnalysisStage::Error => error!(
                "[{:>3}%] {}: {}",
                snapshot.progress,
                snapshot.current_step,
                snapshot.error.as_deref().unwrap_or("unknown error")
            ),
            _ => info!("[{:>3}%] {}", snapshot.progress, snapshot.current_step),
        }
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(&AnalysisProgress) + Send + Sync,
{
    fn on_progress(&self, snapshot: &AnalysisProgress) {
        (self.0)(snapshot)
    }
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn on_progress(&self, _snapshot: &AnalysisProgress) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ChannelSink::new(tx);

        let mut snapshot = AnalysisProgress::idle();
        sink.on_progress(&snapshot);
        snapshot.progress = 5;
        snapshot.status = AnalysisStage::DiscoveringBrands;
        sink.on_progress(&snapshot);

        assert_eq!(rx.try_recv().unwrap().status, AnalysisStage::Idle);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.status, AnalysisStage::DiscoveringBrands);
        assert_eq!(second.progress, 5);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        // Must not panic or block.
        ChannelSink::new(tx).on_progress(&AnalysisProgress::idle());
    }

    #[test]
    fn test_fn_sink_and_shared_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let sink: Arc<dyn ProgressSink> = Arc::new(FnSink(move |snapshot: &AnalysisProgress| {
            recorder.lock().unwrap().push(snapshot.progress);
        }));

        sink.on_progress(&AnalysisProgress::idle());
        sink.clone().on_progress(&AnalysisProgress::idle());

        assert_eq!(*seen.lock().unwrap(), vec![0, 0]);
    }
}
