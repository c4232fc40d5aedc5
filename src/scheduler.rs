//! Fixed-period tick loop
//!
//! Each tick runs acquire, derive, build, send to completion before the
//! next one starts. The loop then sleeps for the full period; there is no
//! catch-up, so under load the effective rate drifts below the configured
//! one and every tick simply samples current state.

use std::future::Future;
use std::time::Duration;

use crate::error::GazecastError;
use crate::output::packet::PacketBuilder;
use crate::output::transport::UdpTransport;
use crate::pipeline::Pipeline;
use crate::tracking::acquirer::SampleAcquirer;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A bundle of this many bytes went out
    Sent(usize),
    /// No family was valid, nothing to send
    Empty,
    /// The bundle could not be built; nothing was sent
    BuildFailed,
    /// The socket refused the datagram
    SendFailed,
}

/// Running counters, logged on shutdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: u64,
    pub bundles_sent: u64,
    pub empty_ticks: u64,
    pub build_failures: u64,
    pub send_failures: u64,
}

/// Owns the device and the socket and drives them one tick at a time
pub struct TickScheduler {
    acquirer: SampleAcquirer,
    pipeline: Pipeline,
    builder: PacketBuilder,
    transport: UdpTransport,
    period: Duration,
    stats: TickStats,
    send_failing: bool,
}

impl TickScheduler {
    /// Assemble the loop, rejecting a mode/mapping whose largest possible
    /// bundle would not fit the packet limit
    pub fn new(
        acquirer: SampleAcquirer,
        pipeline: Pipeline,
        builder: PacketBuilder,
        transport: UdpTransport,
        period: Duration,
    ) -> Result<Self, GazecastError> {
        let worst = builder.check(&pipeline.worst_case())?;
        tracing::debug!(
            "Largest bundle is {} of {} bytes",
            worst,
            builder.max_size()
        );

        Ok(Self {
            acquirer,
            pipeline,
            builder,
            transport,
            period,
            stats: TickStats::default(),
            send_failing: false,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    /// Run one full tick: acquire, derive, build, send
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;

        let sample = self.acquirer.acquire();
        let signals = self.pipeline.derive(&sample);

        if signals.is_empty() {
            tracing::trace!("Tick {}: no valid tracking data", self.stats.ticks);
            self.stats.empty_ticks += 1;
            return TickOutcome::Empty;
        }

        let payload = match self.builder.build(&signals) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Dropping tick {}: {}", self.stats.ticks, e);
                self.stats.build_failures += 1;
                return TickOutcome::BuildFailed;
            }
        };

        match self.transport.send(&payload) {
            Ok(size) => {
                if self.send_failing {
                    tracing::info!("Sending to {} again", self.transport.destination());
                    self.send_failing = false;
                }
                self.stats.bundles_sent += 1;
                TickOutcome::Sent(size)
            }
            Err(e) => {
                if self.send_failing {
                    tracing::debug!("Send failed: {}", e);
                } else {
                    tracing::warn!("Send to {} failed: {}", self.transport.destination(), e);
                    self.send_failing = true;
                }
                self.stats.send_failures += 1;
                TickOutcome::SendFailed
            }
        }
    }

    /// Tick until `shutdown` resolves, sleeping one period between ticks
    pub async fn run<F>(&mut self, shutdown: F) -> TickStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(
            "Forwarding {:?} tracking from {} device every {:?}",
            self.pipeline.mode(),
            self.acquirer.device_name(),
            self.period
        );

        loop {
            self.tick();

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.period) => {}
            }
        }

        tracing::info!(
            "Stopped after {} ticks ({} sent, {} empty, {} build failures, {} send failures)",
            self.stats.ticks,
            self.stats.bundles_sent,
            self.stats.empty_ticks,
            self.stats.build_failures,
            self.stats.send_failures
        );

        self.stats
    }
}
