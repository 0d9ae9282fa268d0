use crate::{dom, SharedGovernor};
use blob_core::KeyCommand;
use glam::Vec2;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Pointer position in CSS pixels relative to the canvas box.
#[inline]
pub fn pointer_css_px(ev: &web::MouseEvent, canvas: &web::HtmlCanvasElement) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    Vec2::new(
        ev.client_x() as f32 - rect.left() as f32,
        ev.client_y() as f32 - rect.top() as f32,
    )
}

fn listen<E: JsCast + 'static>(
    target: &web::EventTarget,
    name: &str,
    mut handler: impl FnMut(E) + 'static,
) {
    let closure = Closure::wrap(Box::new(move |ev: web::Event| {
        if let Ok(ev) = ev.dyn_into::<E>() {
            handler(ev);
        }
    }) as Box<dyn FnMut(web::Event)>);
    if target
        .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        .is_err()
    {
        log::warn!("[events] could not attach {name}");
    }
    closure.forget();
}

pub fn wire_pointer(canvas: &web::HtmlCanvasElement, governor: &SharedGovernor) {
    let target: &web::EventTarget = canvas.as_ref();
    {
        let gov = governor.clone();
        let canvas = canvas.clone();
        listen(target, "pointermove", move |ev: web::PointerEvent| {
            let p = pointer_css_px(&ev, &canvas);
            if let Ok(mut g) = gov.try_borrow_mut() {
                g.set_pointer_screen(p.x, p.y);
            }
        });
    }
    {
        let gov = governor.clone();
        let canvas = canvas.clone();
        listen(target, "pointerdown", move |ev: web::PointerEvent| {
            let p = pointer_css_px(&ev, &canvas);
            if let Ok(mut g) = gov.try_borrow_mut() {
                g.set_pointer_screen(p.x, p.y);
                g.set_pointer_pressed(true);
            }
        });
    }
    {
        let gov = governor.clone();
        listen(target, "pointerup", move |_: web::PointerEvent| {
            if let Ok(mut g) = gov.try_borrow_mut() {
                g.set_pointer_pressed(false);
            }
        });
    }
    for name in ["pointerleave", "pointercancel"] {
        let gov = governor.clone();
        listen(target, name, move |_: web::PointerEvent| {
            if let Ok(mut g) = gov.try_borrow_mut() {
                g.clear_pointer();
            }
        });
    }
}

pub fn wire_keyboard(window: &web::Window, governor: &SharedGovernor) {
    let gov = governor.clone();
    listen(window.as_ref(), "keydown", move |ev: web::KeyboardEvent| {
        if ev.repeat() {
            return;
        }
        let Some(cmd) = KeyCommand::from_key(&ev.key()) else {
            return;
        };
        if cmd == KeyCommand::TogglePause {
            ev.prevent_default();
        }
        if let Ok(mut g) = gov.try_borrow_mut() {
            cmd.apply(g.model_mut());
        }
    });
}

pub fn wire_resize(window: &web::Window, canvas: &web::HtmlCanvasElement, governor: &SharedGovernor) {
    let gov = governor.clone();
    let canvas = canvas.clone();
    listen(window.as_ref(), "resize", move |_: web::Event| {
        let viewport = dom::sync_canvas_backing_size(&canvas);
        if let Ok(mut g) = gov.try_borrow_mut() {
            g.resize(viewport);
        }
    });
}
