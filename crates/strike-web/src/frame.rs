use instant::Instant;
use web_sys as web;

use crate::audio::WebAudioBackend;
use crate::render::WgpuEffects;
use strike_core::music::MusicDirector;
use strike_core::postfx::PostFxManager;

/// Everything the per-animation-frame callback needs. Both managers are
/// advanced exactly once per frame, then the backend executes the chain.
pub struct FrameContext {
    pub manager: PostFxManager<WgpuEffects>,
    pub director: MusicDirector<WebAudioBackend>,
    pub canvas: web::HtmlCanvasElement,
    pub last_instant: Instant,
    pub paused: bool,
}

impl FrameContext {
    pub fn frame(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_instant).as_secs_f32();
        self.last_instant = now;
        if self.paused {
            return;
        }

        // Track canvas backing size; the resize listener updates the element,
        // the GPU targets follow here at the tick boundary.
        let width = self.canvas.width();
        let height = self.canvas.height();
        self.manager.backend_mut().resize(width, height);

        self.director.tick(dt);
        self.manager.update(dt);
        self.manager.backend_mut().render_frame(dt);
    }
}
