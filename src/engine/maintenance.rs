//! Background maintenance loop
//!
//! One dedicated thread running at a fixed cadence for the life of the
//! engine. Each iteration reclaims finished one-shot voices, then recycles
//! consumed stream buffers, taking the two locks one at a time and never
//! together. Device faults are isolated to the entry that raised them; the
//! loop itself only exits when the shutdown flag is set.

use crate::device::AudioDevice;
use crate::engine::effects::{self, ActiveEffect};
use crate::engine::stream::{StreamSlot, STREAM_SLOTS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

pub(crate) fn run(
    effects: Arc<Mutex<Vec<ActiveEffect>>>,
    slots: Arc<Mutex<[StreamSlot; STREAM_SLOTS]>>,
    device: Arc<dyn AudioDevice>,
    stop_flag: Arc<AtomicBool>,
    tick_rate_hz: u32,
) {
    let tick = Duration::from_millis(u64::from(1000 / tick_rate_hz.max(1)));
    debug!(?tick, "maintenance loop started");

    while !stop_flag.load(Ordering::Relaxed) {
        {
            let mut set = effects.lock().unwrap();
            effects::reclaim_finished(&mut set, device.as_ref());
        }

        {
            let mut slots = slots.lock().unwrap();
            for (index, slot) in slots.iter_mut().enumerate() {
                if let Err(e) = slot.service(device.as_ref()) {
                    // Confined to this slot; the loop and the other slots
                    // carry on
                    warn!(slot = index, error = %e, "stream service failed");
                }
            }
        }

        std::thread::sleep(tick);
    }

    debug!("maintenance loop stopped");
}
