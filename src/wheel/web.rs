//! Browser bindings: canvas surface and requestAnimationFrame scheduler

use std::rc::Rc;

use glam::DVec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::layout::TextMeasure;
use super::render::WheelSurface;
use super::scheduler::{FrameHandle, FrameScheduler};

/// 2D canvas drawing with device-pixel-ratio scaling
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    fn device_pixel_ratio() -> f64 {
        web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .filter(|dpr| *dpr > 0.0)
            .unwrap_or(1.0)
    }
}

impl TextMeasure for CanvasSurface {
    fn measure_text(&self, text: &str) -> f64 {
        self.ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
    }
}

impl WheelSurface for CanvasSurface {
    fn css_size(&self) -> (f64, f64) {
        (
            self.canvas.client_width() as f64,
            self.canvas.client_height() as f64,
        )
    }

    fn ensure_backing_store(&mut self) -> bool {
        let dpr = Self::device_pixel_ratio();
        let (w, h) = self.css_size();
        let width = (w * dpr).round() as u32;
        let height = (h * dpr).round() as u32;
        if self.canvas.width() == width && self.canvas.height() == height {
            return false;
        }
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
        true
    }

    fn clear(&mut self) {
        let (w, h) = self.css_size();
        self.ctx.clear_rect(0.0, 0.0, w, h);
    }

    fn fill_wedge(&mut self, center: DVec2, radius: f64, start: f64, end: f64, color: &str) {
        self.ctx.begin_path();
        self.ctx.move_to(center.x, center.y);
        let _ = self.ctx.arc(center.x, center.y, radius, start, end);
        self.ctx.close_path();
        self.ctx.set_fill_style_str(color);
        self.ctx.fill();
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, fill: &str, stroke: Option<&str>) {
        self.ctx.begin_path();
        let _ = self
            .ctx
            .arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU);
        self.ctx.set_fill_style_str(fill);
        self.ctx.fill();
        if let Some(stroke) = stroke {
            self.ctx.set_line_width(3.0);
            self.ctx.set_stroke_style_str(stroke);
            self.ctx.stroke();
        }
    }

    fn fill_polygon(&mut self, points: &[DVec2], color: &str) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.begin_path();
        self.ctx.move_to(first.x, first.y);
        for p in rest {
            self.ctx.line_to(p.x, p.y);
        }
        self.ctx.close_path();
        self.ctx.set_fill_style_str(color);
        self.ctx.fill();
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }

    fn fill_text(&mut self, text: &str, at: DVec2, rotation: f64, color: &str) {
        self.ctx.save();
        let _ = self.ctx.translate(at.x, at.y);
        let _ = self.ctx.rotate(rotation);
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx.set_fill_style_str(color);
        let _ = self.ctx.fill_text(text, 0.0, 0.0);
        self.ctx.restore();
    }
}

/// `requestAnimationFrame` scheduler; frames are delivered to `on_frame`
#[derive(Default)]
pub struct RafScheduler {
    on_frame: Option<Rc<dyn Fn(f64)>>,
}

impl RafScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the callback that receives each frame timestamp (ms)
    pub fn set_callback(&mut self, on_frame: Rc<dyn Fn(f64)>) {
        self.on_frame = Some(on_frame);
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let (Some(window), Some(on_frame)) = (web_sys::window(), self.on_frame.clone()) else {
            log::warn!("No window or frame callback; frame not scheduled");
            return FrameHandle(0);
        };
        let closure = Closure::once(move |time: f64| on_frame(time));
        let id = window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .unwrap_or(0);
        closure.forget();
        FrameHandle(id)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(handle.0);
        }
    }
}
