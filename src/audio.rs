use crate::backend::WebAudioBackend;
use std::cell::RefCell;
use std::rc::Rc;
use synth_core::{Synth, SequencerEvent, SCHEDULER_TICK_MS};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

/// Browsers start contexts suspended until a user gesture; resume on demand.
pub fn ensure_running(ctx: &web::AudioContext) {
    if ctx.state() != web::AudioContextState::Suspended {
        return;
    }
    match ctx.resume() {
        Ok(promise) => spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(_) => log::info!("[audio] context resumed"),
                Err(e) => log::warn!("[audio] resume failed: {:?}", e),
            }
        }),
        Err(e) => log::warn!("[audio] resume failed: {:?}", e),
    }
}

/// Fixed-interval driver for `Synth::tick`. Cleared on drop.
pub struct Scheduler {
    interval_id: i32,
    _tick: Closure<dyn FnMut()>,
}

impl Scheduler {
    pub fn start(synth: Rc<RefCell<Synth<WebAudioBackend>>>) -> anyhow::Result<Self> {
        let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
        let tick = Closure::wrap(Box::new(move || {
            let mut s = synth.borrow_mut();
            for ev in s.tick() {
                if let SequencerEvent::Step { index, time } = ev {
                    log::debug!("[seq] step {} at {:.3}", index, time);
                }
            }
        }) as Box<dyn FnMut()>);
        let interval_id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                SCHEDULER_TICK_MS,
            )
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        Ok(Self {
            interval_id,
            _tick: tick,
        })
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(w) = web::window() {
            w.clear_interval_with_handle(self.interval_id);
        }
    }
}
