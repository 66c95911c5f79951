// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Single-shot wait for a status notification.
//!
//! A correlator is armed right before a command is written. The
//! notification callback feeds it raw bytes; the first frame that decodes
//! as a status report resolves the wait and everything after it is ignored.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use super::address::DeviceAddress;
use super::protocol::{decode_status, PowerState};

/// The in-flight half of an armed wait: where the resolving state goes.
struct PendingWait {
    tx: Option<oneshot::Sender<PowerState>>,
    rx: Option<oneshot::Receiver<PowerState>>,
}

/// Wait gate bound to one outstanding command for one device.
pub struct NotificationCorrelator {
    address: DeviceAddress,
    pending: Mutex<Option<PendingWait>>,
}

impl NotificationCorrelator {
    /// Create an unarmed correlator for `address`.
    pub fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            pending: Mutex::new(None),
        }
    }

    /// Prepare to receive exactly one resolving event.
    ///
    /// Re-arming discards any previous wait.
    pub fn arm(&self) {
        let (tx, rx) = oneshot::channel();
        *self.pending.lock() = Some(PendingWait {
            tx: Some(tx),
            rx: Some(rx),
        });
    }

    /// Feed a raw notification.
    ///
    /// Returns `true` if this notification resolved the wait.
    pub fn on_event(&self, raw: &[u8]) -> bool {
        let Some(state) = decode_status(raw) else {
            trace!("{}: ignoring notification {:02X?}", self.address, raw);
            return false;
        };

        let tx = match self.pending.lock().as_mut() {
            Some(pending) => pending.tx.take(),
            None => None,
        };

        match tx {
            Some(tx) => {
                debug!("{}: status notification reports {}", self.address, state.as_str());
                // The receiver may already have timed out.
                tx.send(state).is_ok()
            }
            None => {
                trace!("{}: status {} arrived with no open wait", self.address, state.as_str());
                false
            }
        }
    }

    /// Wait for the armed event or for `timeout` to elapse.
    ///
    /// Returns the reported on/off state, or `None` on timeout. The wait is
    /// consumed either way.
    pub async fn await_result(&self, timeout: Duration) -> Option<bool> {
        let rx = self.pending.lock().as_mut().and_then(|pending| pending.rx.take());
        let Some(rx) = rx else {
            warn!("{}: await_result called without arm()", self.address);
            return None;
        };

        let result = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(state)) => Some(state.is_on()),
            Ok(Err(_)) => None,
            Err(_) => {
                debug!(
                    "{}: no status notification within {:?}",
                    self.address, timeout
                );
                None
            }
        };

        *self.pending.lock() = None;
        result
    }

    /// Whether a wait is armed and still unresolved.
    pub fn is_armed(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .map(|pending| pending.tx.is_some())
            .unwrap_or(false)
    }
}
