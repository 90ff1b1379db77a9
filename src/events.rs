use crate::audio;
use crate::backend::WebAudioBackend;
use std::cell::RefCell;
use std::rc::Rc;
use synth_core::{PressedKeys, Synth};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Play the computer-keyboard rows as a piano.
///
/// Modifier chords are left to the browser, and held keys are tracked so
/// auto-repeat keydowns do not retrigger the note.
pub fn wire_keyboard(synth: Rc<RefCell<Synth<WebAudioBackend>>>) {
    let Some(document) = crate::dom::window_document() else {
        return;
    };
    let pressed = Rc::new(RefCell::new(PressedKeys::new()));

    let synth_down = synth.clone();
    let pressed_down = pressed.clone();
    let keydown = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
        if ev.meta_key() || ev.ctrl_key() || ev.alt_key() {
            return;
        }
        let Some(note) = pressed_down.borrow_mut().press(&ev.key()) else {
            return;
        };
        let mut s = synth_down.borrow_mut();
        audio::ensure_running(s.engine().backend().context());
        _ = s.note_on(note, None);
    }) as Box<dyn FnMut(_)>);
    _ = document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
    keydown.forget();

    let keyup = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
        if let Some(note) = pressed.borrow_mut().release(&ev.key()) {
            synth.borrow_mut().note_off(note, None);
        }
    }) as Box<dyn FnMut(_)>);
    _ = document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref());
    keyup.forget();
}
