#![cfg(target_arch = "wasm32")]
//! Browser front-end: wires the WebGPU effect backend and the WebAudio
//! backend into the core managers, then drives both from one animation-frame
//! loop. Audio and GPU startup are gated behind the first user click because
//! an AudioContext may not start without a gesture.

mod audio;
mod dom;
mod events;
mod frame;
mod render;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use instant::Instant;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

use audio::WebAudioBackend;
use frame::FrameContext;
use render::WgpuEffects;
use strike_core::config::{QualityTier, SettingsPatch};
use strike_core::effects::CameraId;
use strike_core::grade::LevelType;
use strike_core::music::{MusicDirector, MusicState};
use strike_core::postfx::PostFxManager;

/// The single player viewpoint this front-end renders.
const PLAYER_CAMERA: CameraId = CameraId(0);

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("strike-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let window = dom::window()?;
    let document = dom::document()?;
    let canvas = dom::canvas("app-canvas")?;

    dom::fit_canvas_to_css(&canvas);
    {
        let canvas_resize = canvas.clone();
        let resize_closure = Closure::wrap(Box::new(move || {
            dom::fit_canvas_to_css(&canvas_resize);
        }) as Box<dyn FnMut()>);
        window
            .add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref())
            .ok();
        resize_closure.forget();
    }

    // On first click, start the audio graph, GPU pipeline, and frame loop.
    static STARTED: AtomicBool = AtomicBool::new(false);
    let canvas_for_click = canvas.clone();
    let document_for_click = document.clone();
    let closure = Closure::wrap(Box::new(move || {
        if STARTED.swap(true, Ordering::SeqCst) {
            log::warn!("[gesture] start already triggered; ignoring extra click");
            return;
        }
        let canvas = canvas_for_click.clone();
        let document = document_for_click.clone();
        spawn_local(async move {
            if let Err(e) = boot(canvas, document).await {
                log::error!("boot error: {:?}", e);
            }
        });
    }) as Box<dyn FnMut()>);
    document
        .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        .ok();
    closure.forget();

    Ok(())
}

async fn boot(canvas: web::HtmlCanvasElement, document: web::Document) -> anyhow::Result<()> {
    log::info!("[gesture] starting systems after click");

    let audio_ctx = web::AudioContext::new()
        .map_err(|e| anyhow::anyhow!("AudioContext error: {e:?}"))?;
    let audio_backend = WebAudioBackend::new(audio_ctx)
        .map_err(|_| anyhow::anyhow!("audio graph construction failed"))?;
    let mut director = MusicDirector::new(audio_backend);
    director.play(MusicState::Menu);

    let gpu = WgpuEffects::new(canvas.clone()).await?;
    let mut manager = PostFxManager::new(
        gpu,
        &[PLAYER_CAMERA],
        QualityTier::High,
        &SettingsPatch::default(),
    )?;
    manager.set_level_type(LevelType::Station);

    let ctx = Rc::new(RefCell::new(FrameContext {
        manager,
        director,
        canvas,
        last_instant: Instant::now(),
        paused: false,
    }));

    events::attach_keyboard(&document, ctx.clone());
    start_frame_loop(ctx);
    Ok(())
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) {
    if let Some(w) = web::window() {
        w.request_animation_frame(f.as_ref().unchecked_ref()).ok();
    }
}

fn start_frame_loop(ctx: Rc<RefCell<FrameContext>>) {
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        ctx.borrow_mut().frame();
        if let Some(cb) = f.borrow().as_ref() {
            request_animation_frame(cb);
        }
    }) as Box<dyn FnMut()>));
    if let Some(cb) = g.borrow().as_ref() {
        request_animation_frame(cb);
    }
}
