//! RPC engine: routes inbound direct methods to the command handler.
//!
//! **Transport-decoupled**: the engine does not own a transport.  The
//! command loop feeds it [`CommandMsg`]s and forwards the returned
//! [`Outbound::Response`] to the write loop.
//!
//! Only `SetFanState` is registered; any other method gets a 501, the
//! same answer the control plane's SDK gives for unregistered methods.

use log::{info, warn};

use crate::app::commands::{
    CommandHandler, CommandResult, SET_FAN_STATE, STATUS_NOT_IMPLEMENTED,
};
use crate::app::ports::ActuatorPort;

use super::channels::{CommandMsg, Outbound};

/// Dispatch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub handled: u64,
    pub rejected: u64,
    pub unknown_method: u64,
}

pub struct RpcEngine<A> {
    handler: CommandHandler<A>,
    stats: EngineStats,
}

impl<A: ActuatorPort> RpcEngine<A> {
    pub fn new(handler: CommandHandler<A>) -> Self {
        Self {
            handler,
            stats: EngineStats::default(),
        }
    }

    /// Route one command and build its response frame.
    pub fn dispatch(&mut self, msg: &CommandMsg) -> Outbound {
        let result = if msg.request.name == SET_FAN_STATE {
            info!("RPC[{}]: {} invoked", msg.id, msg.request.name);
            let result = self.handler.handle(&msg.request);
            if result.is_success() {
                self.stats.handled += 1;
            } else {
                self.stats.rejected += 1;
            }
            result
        } else {
            warn!("RPC[{}]: unknown method '{}'", msg.id, msg.request.name);
            self.stats.unknown_method += 1;
            CommandResult::new(
                STATUS_NOT_IMPLEMENTED,
                format!("Method not implemented: {}", msg.request.name),
            )
        };

        Outbound::Response { id: msg.id, result }
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}
