//! Transport-agnostic direct-method link.
//!
//! Newline-delimited JSON over any byte stream.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      RPC Stack                             │
//! │                                                            │
//! │  ┌──────────┐   ┌──────────┐   ┌───────────────────────┐   │
//! │  │  Reader  │──▶│  Codec   │──▶│  Engine (dispatcher)  │   │
//! │  │ (thread) │   │ (lines)  │   │  → CommandHandler     │   │
//! │  └──────────┘   └──────────┘   └───────────────────────┘   │
//! │                                            │               │
//! │       ┌────────────────────────────────────┘               │
//! │       ▼                                                    │
//! │  ┌──────────┐   ┌──────────┐                               │
//! │  │  Writer  │◀──│ Reporter │   (telemetry snapshots)       │
//! │  │ (async)  │   │          │                               │
//! │  └──────────┘   └──────────┘                               │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod channels;
pub mod codec;
pub mod engine;
pub mod io_task;
