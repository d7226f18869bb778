use std::sync::atomic::{AtomicU64, Ordering};

use super::Error;

/// Track codec activity without external dependencies.
pub(crate) struct Metrics;

static MESSAGES_PACKED: AtomicU64 = AtomicU64::new(0);
static PACKETS_EMITTED: AtomicU64 = AtomicU64::new(0);
static FRAGMENTS_EMITTED: AtomicU64 = AtomicU64::new(0);
static PACKETS_UNPACKED: AtomicU64 = AtomicU64::new(0);
static LENGTH_REJECTS: AtomicU64 = AtomicU64::new(0);
static HEADER_REJECTS: AtomicU64 = AtomicU64::new(0);
static BODY_REJECTS: AtomicU64 = AtomicU64::new(0);

impl Metrics {
    #[inline]
    pub(crate) fn record_message_packed() {
        MESSAGES_PACKED.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_packet_emitted(fragment: bool) {
        PACKETS_EMITTED.fetch_add(1, Ordering::Relaxed);
        if fragment {
            FRAGMENTS_EMITTED.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_unpacked() {
        PACKETS_UNPACKED.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejection(err: &Error) {
        let counter = match err {
            Error::InvalidPacketLength { .. } | Error::InvalidHeaderLength { .. } => {
                &LENGTH_REJECTS
            }
            Error::HeaderIntegrity { .. } => &HEADER_REJECTS,
            Error::BodyIntegrity { .. } => &BODY_REJECTS,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn totals() -> MetricsSnapshot {
        MetricsSnapshot {
            messages_packed: MESSAGES_PACKED.load(Ordering::Relaxed),
            packets_emitted: PACKETS_EMITTED.load(Ordering::Relaxed),
            fragments_emitted: FRAGMENTS_EMITTED.load(Ordering::Relaxed),
            packets_unpacked: PACKETS_UNPACKED.load(Ordering::Relaxed),
            length_rejects: LENGTH_REJECTS.load(Ordering::Relaxed),
            header_rejects: HEADER_REJECTS.load(Ordering::Relaxed),
            body_rejects: BODY_REJECTS.load(Ordering::Relaxed),
        }
    }
}

/// Process-wide codec counters
#[must_use]
pub fn metrics() -> MetricsSnapshot {
    Metrics::totals()
}

/// Lightweight snapshot of codec counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct MetricsSnapshot {
    pub messages_packed: u64,
    pub packets_emitted: u64,
    pub fragments_emitted: u64,
    pub packets_unpacked: u64,
    pub length_rejects: u64,
    pub header_rejects: u64,
    pub body_rejects: u64,
}

impl MetricsSnapshot {
    /// Total packets rejected by `unpack`
    #[must_use]
    pub const fn total_rejects(&self) -> u64 {
        self.length_rejects + self.header_rejects + self.body_rejects
    }

    /// Counter deltas since an earlier snapshot
    #[must_use]
    pub const fn since(&self, earlier: &Self) -> Self {
        Self {
            messages_packed: self.messages_packed.saturating_sub(earlier.messages_packed),
            packets_emitted: self.packets_emitted.saturating_sub(earlier.packets_emitted),
            fragments_emitted: self
                .fragments_emitted
                .saturating_sub(earlier.fragments_emitted),
            packets_unpacked: self.packets_unpacked.saturating_sub(earlier.packets_unpacked),
            length_rejects: self.length_rejects.saturating_sub(earlier.length_rejects),
            header_rejects: self.header_rejects.saturating_sub(earlier.header_rejects),
            body_rejects: self.body_rejects.saturating_sub(earlier.body_rejects),
        }
    }
}
