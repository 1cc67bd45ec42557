//! Procedural Face
//!
//! Draws eyes, brows and mouth from [`EmotionParams`] instead of swapping
//! sprites, so every transition is a smooth geometric blend. Layered on top
//! are the micro-animations that keep the face alive:
//!
//! - random blinks (eye height squashed to 20% for `blink_duration`)
//! - per-frame eye jitter
//! - mouth openness smoothed toward the speaking level
//! - a pulsing scale and edge glow while listening

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ProceduralConfig;
use crate::emotion::EmotionParams;
use crate::frame::{Frame, Rgb};

const BROW_THICKNESS: f32 = 4.0;
const MOUTH_STEPS: usize = 20;
const BLINK_SQUASH: f32 = 0.2;

/// Procedural face renderer
#[derive(Debug)]
pub struct ProceduralFaceRenderer {
    size: (u32, u32),
    surface: Frame,
    config: ProceduralConfig,
    rng: StdRng,

    blink_timer: f32,
    time_since_blink: f32,
    next_blink: f32,
    is_blinking: bool,

    mouth_level: f32,
    listening_phase: f32,
}

impl ProceduralFaceRenderer {
    /// Create a renderer for the given screen size
    #[must_use]
    pub fn new(size: (u32, u32), config: ProceduralConfig) -> Self {
        Self::with_rng(size, config, StdRng::from_entropy())
    }

    /// Create a renderer with a fixed random seed
    #[must_use]
    pub fn with_seed(size: (u32, u32), config: ProceduralConfig, seed: u64) -> Self {
        Self::with_rng(size, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(size: (u32, u32), config: ProceduralConfig, rng: StdRng) -> Self {
        let mut renderer = Self {
            size,
            surface: Frame::new(size.0, size.1),
            config,
            rng,
            blink_timer: 0.0,
            time_since_blink: 0.0,
            next_blink: 0.0,
            is_blinking: false,
            mouth_level: 0.0,
            listening_phase: 0.0,
        };
        renderer.next_blink = renderer.random_blink_interval();
        renderer
    }

    fn random_blink_interval(&mut self) -> f32 {
        let (lo, hi) = self.config.blink_interval;
        if hi > lo {
            self.rng.gen_range(lo..=hi)
        } else {
            lo
        }
    }

    /// Whether the eyes are currently closed mid-blink
    #[must_use]
    pub fn is_blinking(&self) -> bool {
        self.is_blinking
    }

    /// Smoothed mouth openness driver
    #[must_use]
    pub fn mouth_level(&self) -> f32 {
        self.mouth_level
    }

    /// Advance animation timers
    pub fn update_state(&mut self, dt: f32, speaking_level: f32, listening: bool) {
        let dt = dt.max(0.0);
        let target = speaking_level.clamp(0.0, 1.0);

        let smooth = self.config.mouth_smooth.max(1e-3);
        let blend = 1.0 - (-smooth * dt).exp();
        self.mouth_level += (target - self.mouth_level) * blend;

        self.time_since_blink += dt;
        if !self.is_blinking && self.time_since_blink >= self.next_blink {
            self.is_blinking = true;
            self.blink_timer = 0.0;
        }
        if self.is_blinking {
            self.blink_timer += dt;
            if self.blink_timer >= self.config.blink_duration {
                self.is_blinking = false;
                self.time_since_blink = 0.0;
                self.next_blink = self.random_blink_interval();
            }
        }

        if listening {
            self.listening_phase += dt * self.config.listening_pulse_speed;
        } else {
            self.listening_phase = 0.0;
        }
    }

    /// Draw the face
    ///
    /// With a `target`, parameters are blended by `alpha` first.
    pub fn render(
        &mut self,
        current: &EmotionParams,
        target: Option<&EmotionParams>,
        alpha: f32,
        listening: bool,
    ) -> &Frame {
        let params = match target {
            Some(target) => current.blend(target, alpha),
            None => current.clone(),
        };
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);
        self.surface.fill(self.config.background.opaque());

        let scale = if listening {
            1.0 + self.listening_phase.sin() * self.config.listening_pulse_strength
        } else {
            1.0
        };
        let jitter = self.config.eye_jitter.abs();
        let blink = if self.is_blinking { BLINK_SQUASH } else { 1.0 };

        for direction in [-1.0_f32, 1.0] {
            let jx = self.rng.gen_range(-jitter..=jitter);
            let jy = self.rng.gen_range(-jitter..=jitter);
            let cx = w / 2.0 + direction * params.eye_spacing * scale + jx;
            let cy = params.eye_y * scale + jy;

            let eye_w = params.eye_width * scale;
            let eye_h = params.eye_height * scale * blink;
            self.surface
                .fill_ellipse(cx, cy, eye_w / 2.0, eye_h / 2.0, params.eye_color);
            self.surface.fill_circle(
                cx + params.pupil_offset,
                cy,
                params.pupil_size / 2.0,
                params.pupil_color,
            );

            self.draw_brow(
                (cx, cy),
                &params,
                params.brow_slant * direction,
            );
        }

        let openness =
            (params.mouth_open + self.mouth_level * params.mouth_sensitivity).clamp(0.0, 1.0);
        self.draw_mouth((w / 2.0, h * 0.7), &params, openness);

        if listening && self.config.listening_glow_alpha > 0.0 {
            let pulse = 0.5 + 0.5 * self.listening_phase.sin();
            let alpha = self.config.listening_glow_alpha * pulse;
            if alpha > 0.0 {
                let thickness = self.config.listening_glow_thickness.max(2) as f32;
                let inset = thickness / 2.0;
                self.surface.stroke_rect(
                    inset,
                    inset,
                    w - thickness,
                    h - thickness,
                    thickness,
                    self.config.listening_glow_color,
                    alpha,
                );
            }
        }

        &self.surface
    }

    fn draw_brow(&mut self, eye: (f32, f32), params: &EmotionParams, slant: f32) {
        let (cx, cy) = eye;
        let y = cy - params.eye_height * (0.8 + params.brow_raise);
        let half = params.eye_width * 0.6;
        self.surface.draw_line(
            (cx - half, y - slant * 10.0),
            (cx + half, y + slant * 10.0),
            BROW_THICKNESS,
            params.brow_color,
        );
    }

    fn draw_mouth(&mut self, center: (f32, f32), params: &EmotionParams, openness: f32) {
        let (cx, cy) = center;
        let half = params.mouth_width / 2.0;
        let thickness = (params.mouth_height * (0.3 + openness)).max(2.0);
        let control = (cx, cy + params.mouth_curve * params.mouth_height);
        let start = (cx - half, cy);
        let end = (cx + half, cy);

        let points: Vec<(f32, f32)> = (0..=MOUTH_STEPS)
            .map(|i| {
                let t = i as f32 / MOUTH_STEPS as f32;
                let u = 1.0 - t;
                (
                    u * u * start.0 + 2.0 * u * t * control.0 + t * t * end.0,
                    u * u * start.1 + 2.0 * u * t * control.1 + t * t * end.1,
                )
            })
            .collect();
        self.surface
            .draw_polyline(&points, thickness, params.mouth_color);
    }

    /// Background color in use
    #[must_use]
    pub fn background(&self) -> Rgb {
        self.config.background
    }
}
