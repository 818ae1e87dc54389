use wasm_bindgen::JsCast;
use web_sys as web;

pub fn window() -> anyhow::Result<web::Window> {
    web::window().ok_or_else(|| anyhow::anyhow!("no window"))
}

pub fn document() -> anyhow::Result<web::Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))
}

pub fn canvas(id: &str) -> anyhow::Result<web::HtmlCanvasElement> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| anyhow::anyhow!("missing #{id}"))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!("not a canvas: {e:?}"))
}

/// Match the canvas backing store to CSS size * devicePixelRatio.
pub fn fit_canvas_to_css(canvas: &web::HtmlCanvasElement) {
    if let Some(w) = web::window() {
        let dpr = w.device_pixel_ratio();
        let rect = canvas.get_bounding_client_rect();
        let width = (rect.width() * dpr) as u32;
        let height = (rect.height() * dpr) as u32;
        canvas.set_width(width.max(1));
        canvas.set_height(height.max(1));
    }
}
