use crate::pending::Pending;
use crate::SharedGovernor;
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>) {
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

/// Drive the governor from requestAnimationFrame until it leaves the
/// running state. Requests queued during a frame are drained after `tick`.
pub fn start_loop(governor: SharedGovernor, pending: Rc<Pending>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let mut last = Instant::now();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;
        let running = match governor.try_borrow_mut() {
            Ok(mut g) => {
                pending.drain(&mut *g);
                g.tick(dt);
                pending.drain(&mut *g);
                g.is_running()
            }
            Err(_) => true,
        };
        if running {
            request_frame(&tick_clone);
        } else {
            log::info!("[frame] loop ended");
        }
    }) as Box<dyn FnMut()>));
    request_frame(&tick);
}
