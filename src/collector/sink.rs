//! Metric samples and the sink that receives them
//!
//! Samples are emitted from the orchestrator and from every fan-out task at
//! the same time, so the sink has to accept concurrent writers. The channel
//! sink forwards into an unbounded mpsc channel drained by a single consumer.

use tokio::sync::mpsc;

/// One metric sample produced by a collection cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// A (center, vaccination type) pair exists; value is always 1
    Presence {
        center: String,
        vaccination: String,
        disabled: bool,
    },

    /// Days until the next available appointment for an enabled pair
    NextSlot {
        center: String,
        vaccination: String,
        days: f64,
    },
}

impl Sample {
    pub fn presence(center: impl Into<String>, vaccination: impl Into<String>, disabled: bool) -> Self {
        Self::Presence {
            center: center.into(),
            vaccination: vaccination.into(),
            disabled,
        }
    }

    pub fn next_slot(center: impl Into<String>, vaccination: impl Into<String>, days: f64) -> Self {
        Self::NextSlot {
            center: center.into(),
            vaccination: vaccination.into(),
            days,
        }
    }

    /// Center label
    pub fn center(&self) -> &str {
        match self {
            Self::Presence { center, .. } | Self::NextSlot { center, .. } => center.as_str(),
        }
    }

    /// Vaccination type label
    pub fn vaccination(&self) -> &str {
        match self {
            Self::Presence { vaccination, .. } | Self::NextSlot { vaccination, .. } => vaccination.as_str(),
        }
    }

    /// Label tuple used to order samples deterministically
    pub fn sort_key(&self) -> (u8, &str, &str, bool) {
        match self {
            Self::Presence {
                center,
                vaccination,
                disabled,
            } => (0, center.as_str(), vaccination.as_str(), *disabled),
            Self::NextSlot {
                center,
                vaccination,
                ..
            } => (1, center.as_str(), vaccination.as_str(), false),
        }
    }
}

/// Receiver of emitted samples; must tolerate concurrent writers
pub trait MetricSink: Send + Sync {
    fn emit(&self, sample: Sample);
}

/// Sink backed by an unbounded mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Sample>,
}

impl ChannelSink {
    /// Create a sink together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Sample>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MetricSink for ChannelSink {
    fn emit(&self, sample: Sample) {
        if self.tx.send(sample).is_err() {
            tracing::warn!("Sample receiver closed, dropping sample");
        }
    }
}
