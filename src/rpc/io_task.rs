//! RPC I/O: blocking reader thread plus the async control executor.
//!
//! The reader runs on a dedicated thread because stream reads block.
//! Everything else runs as cooperative tasks on one `edge-executor`
//! `LocalExecutor`, with `async-io-mini` timers:
//!
//! ```text
//!  ┌──────────────┐       ┌──────────────────────────────────────────────┐
//!  │ Reader thread│       │  Control thread (futures_lite::block_on)     │
//!  │ read → decode│──cmd─▶│  ┌───────────┐ ┌─────────────┐ ┌──────────┐  │
//!  │ EOF → stop   │       │  │ Telemetry │ │ Command loop│ │  Writer  │  │
//!  └──────────────┘       │  │ ⏱ interval│ │ wake-on-cmd │ │ wake-on- │  │
//!                         │  └───────────┘ └─────────────┘ │ outbound │  │
//!                         │                                └──────────┘  │
//!                         └──────────────────────────────────────────────┘
//! ```
//!
//! Shutdown order: end of input stops the telemetry and command loops;
//! once both have returned the writer is stopped and flushes whatever
//! they queued last.
//!
//! Backpressure: the reader waits for room in the command channel and the
//! command loop waits for room in the outbound channel, so no request
//! goes unanswered.  Telemetry reports are the exception: a report that
//! finds the outbound channel full is skipped like any failed cycle.
//!
//! The writer does blocking writes from inside the executor.  A consumer
//! that stops reading stdout therefore stalls telemetry and command
//! dispatch along with it; a closed stdout shuts the agent down.

use core::time::Duration;
use std::io::{ErrorKind, Read, Write};

use log::{info, warn};

use crate::app::ports::{ActuatorPort, ReportChannel, SensorPort};
use crate::app::telemetry::{TelemetryLoop, TelemetryStats};
use crate::error::TransportError;

use super::channels::{Link, Outbound};
use super::codec::{FrameDecoder, OutboundFrame, decode_frame, encode_frame};
use super::engine::{EngineStats, RpcEngine};

const READ_BUF_SIZE: usize = 256;

// ── Reader (blocking) ────────────────────────────────────────

/// Read frames from `reader` until end of stream, queueing every decoded
/// command.  Requests shutdown when the stream ends or fails.
pub fn read_loop(mut reader: impl Read, link: &Link) {
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; READ_BUF_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => {
                info!("IO: input closed");
                break;
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("IO: read error: {}", e);
                break;
            }
        };

        decoder.feed(&buf[..n], |line| match decode_frame(line) {
            // Blocks this thread until the command loop makes room.
            Ok(msg) => futures_lite::future::block_on(link.submit(msg)),
            Err(e) => warn!("IO: malformed frame dropped: {}", e),
        });
    }

    if decoder.dropped() > 0 {
        warn!("IO: {} oversized frames were dropped", decoder.dropped());
    }
    link.request_shutdown();
}

/// Spawn [`read_loop`] on its own thread.
pub fn spawn_reader<R>(reader: R, link: &'static Link) -> std::io::Result<std::thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    std::thread::Builder::new()
        .name("rpc-reader".into())
        .spawn(move || read_loop(reader, link))
}

// ── Async tasks ──────────────────────────────────────────────

/// Dispatch queued commands until `stop_commands` is raised.
///
/// Commands already queued when the stop arrives are still handled.  Each
/// response waits for room in the outbound channel rather than being lost.
pub async fn command_loop<A: ActuatorPort>(link: &Link, engine: &mut RpcEngine<A>) {
    loop {
        let next = futures_lite::future::or(async { Some(link.commands.receive().await) }, async {
            link.stop_commands.wait().await;
            None
        })
        .await;

        let Some(msg) = next else {
            break;
        };

        link.outbound.send(engine.dispatch(&msg)).await;
    }

    // Handle whatever was still queued behind the stop.
    while let Ok(msg) = link.commands.try_receive() {
        link.outbound.send(engine.dispatch(&msg)).await;
    }
}

/// Write outbound frames until `stop_writer` is raised, then flush the rest.
pub async fn write_loop<W: Write>(link: &Link, mut writer: W, device: &str) {
    loop {
        let next = futures_lite::future::or(async { Some(link.outbound.receive().await) }, async {
            link.stop_writer.wait().await;
            None
        })
        .await;

        let Some(frame) = next else {
            break;
        };
        match write_frame(&mut writer, &frame, device) {
            Ok(()) => {}
            // Keep draining so producers never block on a dead stream.
            Err(TransportError::Closed) => link.request_shutdown(),
            Err(e) => warn!("IO: frame not written: {}", e),
        }
    }

    while let Ok(frame) = link.outbound.try_receive() {
        match write_frame(&mut writer, &frame, device) {
            Ok(()) => {}
            Err(TransportError::Closed) => break,
            Err(e) => warn!("IO: frame not written: {}", e),
        }
    }
}

/// Encode and write one frame.  `Closed` means the stream is gone.
fn write_frame(writer: &mut impl Write, frame: &Outbound, device: &str) -> Result<(), TransportError> {
    let line = encode_frame(&OutboundFrame::from_outbound(frame, device))?;

    writer.write_all(&line).and_then(|()| writer.flush()).map_err(|e| {
        if e.kind() == ErrorKind::BrokenPipe {
            warn!("IO: output closed");
            TransportError::Closed
        } else {
            warn!("IO: write failed: {}", e);
            TransportError::PublishFailed
        }
    })
}

/// Run telemetry, command dispatch and the writer on one executor until
/// the link is shut down.
pub fn run_io_loop<S, R, A, W>(
    link: &Link,
    mut telemetry: TelemetryLoop<S, R, A>,
    interval: Duration,
    mut engine: RpcEngine<A>,
    writer: W,
    device: &str,
) -> (TelemetryStats, EngineStats)
where
    S: SensorPort,
    R: ReportChannel,
    A: ActuatorPort,
    W: Write,
{
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();

    info!("IO loop started (device '{}')", device);

    futures_lite::future::block_on(executor.run(async {
        let writer_task = executor.spawn(write_loop(link, writer, device));
        let telemetry_task = executor.spawn(async move {
            telemetry.run(interval, &link.stop_telemetry).await;
            telemetry.stats()
        });
        let command_task = executor.spawn(async move {
            command_loop(link, &mut engine).await;
            engine.stats()
        });

        let telemetry_stats = telemetry_task.await;
        let engine_stats = command_task.await;
        link.stop_writer.signal(());
        writer_task.await;

        (telemetry_stats, engine_stats)
    }))
}
