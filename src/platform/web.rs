//! Browser backends: `requestAnimationFrame` scheduling and the ranking
//! WebSocket

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket, Window};

use crate::clock::FrameScheduler;
use crate::ranking::{FeedMessage, decode_frames, handshake};

/// Shared slot for the per-frame callback.
///
/// Filled once the game exists, since the callback needs a handle to it.
pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

pub struct AnimationFrameScheduler {
    window: Window,
    callback: FrameCallback,
}

impl AnimationFrameScheduler {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            callback: Rc::new(RefCell::new(None)),
        }
    }

    pub fn callback_slot(&self) -> FrameCallback {
        self.callback.clone()
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    type Handle = i32;

    fn request_frame(&mut self) -> Option<i32> {
        let slot = self.callback.borrow();
        let Some(callback) = slot.as_ref() else {
            log::warn!("Frame requested before the loop callback was installed");
            return None;
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("requestAnimationFrame failed: {:?}", e);
                None
            }
        }
    }

    fn cancel_frame(&mut self, handle: i32) {
        if let Err(e) = self.window.cancel_animation_frame(handle) {
            log::warn!("cancelAnimationFrame failed: {:?}", e);
        }
    }
}

/// Live ranking hub connection
pub struct RankingSocket {
    socket: WebSocket,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

impl RankingSocket {
    /// Connect to the hub; decoded messages are passed to `on_messages`
    pub fn connect<F>(url: &str, mut on_messages: F) -> Result<Self, JsValue>
    where
        F: FnMut(Vec<FeedMessage>) + 'static,
    {
        let socket = WebSocket::new(url)?;

        let on_open = {
            let socket = socket.clone();
            Closure::<dyn FnMut(_)>::new(move |_event: Event| {
                if let Err(e) = socket.send_with_str(&handshake()) {
                    log::error!("Ranking handshake failed: {:?}", e);
                }
            })
        };
        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_message = Closure::<dyn FnMut(_)>::new(move |event: MessageEvent| {
            match event.data().as_string() {
                Some(text) => on_messages(decode_frames(&text)),
                None => log::warn!("Ignoring non-text ranking frame"),
            }
        });
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_close = Closure::<dyn FnMut(_)>::new(move |event: CloseEvent| {
            log::info!(
                "Ranking connection closed (code {}, {})",
                event.code(),
                event.reason()
            );
        });
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        log::info!("Connecting to ranking hub at {}", url);
        Ok(Self {
            socket,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
        })
    }

    pub fn close(&self) {
        self.socket.set_onmessage(None);
        if let Err(e) = self.socket.close() {
            log::warn!("Failed to close ranking socket: {:?}", e);
        }
    }
}

impl Drop for RankingSocket {
    fn drop(&mut self) {
        self.close();
    }
}
