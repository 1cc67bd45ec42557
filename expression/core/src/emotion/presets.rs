//! Built-in emotion presets
//!
//! Geometry rows are, in order: eye spacing, eye width, eye height, eye y,
//! pupil size, pupil offset, brow raise, brow slant, mouth width, mouth
//! height, mouth curve, mouth open, mouth sensitivity. Colors follow as
//! eye, pupil, brow, mouth.

use super::EmotionParams;
use crate::frame::Rgb;

/// Emotion every lookup falls back to
pub const FALLBACK_EMOTION: &str = "happy";

fn preset(g: [f32; 13], colors: [Rgb; 4]) -> EmotionParams {
    EmotionParams {
        eye_spacing: g[0],
        eye_width: g[1],
        eye_height: g[2],
        eye_y: g[3],
        pupil_size: g[4],
        pupil_offset: g[5],
        brow_raise: g[6],
        brow_slant: g[7],
        mouth_width: g[8],
        mouth_height: g[9],
        mouth_curve: g[10],
        mouth_open: g[11],
        mouth_sensitivity: g[12],
        eye_color: colors[0],
        pupil_color: colors[1],
        brow_color: colors[2],
        mouth_color: colors[3],
    }
}

/// The twelve built-in emotions
pub fn builtin() -> Vec<(&'static str, EmotionParams)> {
    vec![
        (
            "happy",
            preset(
                [90.0, 44.0, 38.0, 95.0, 12.0, 2.0, 0.1, -0.05, 130.0, 26.0, 0.35, 0.08, 0.7],
                [Rgb(245, 245, 245), Rgb(20, 20, 20), Rgb(230, 230, 230), Rgb(240, 140, 140)],
            ),
        ),
        (
            "sad",
            preset(
                [85.0, 42.0, 36.0, 100.0, 11.0, -1.0, -0.1, 0.15, 120.0, 22.0, -0.45, 0.05, 0.55],
                [Rgb(235, 235, 240), Rgb(15, 15, 25), Rgb(210, 210, 220), Rgb(200, 120, 160)],
            ),
        ),
        (
            "excited",
            preset(
                [95.0, 46.0, 40.0, 92.0, 13.0, 3.0, 0.25, -0.08, 140.0, 28.0, 0.5, 0.18, 0.9],
                [Rgb(250, 250, 250), Rgb(10, 10, 10), Rgb(240, 240, 240), Rgb(255, 150, 150)],
            ),
        ),
        (
            "curious",
            preset(
                [88.0, 44.0, 38.0, 96.0, 12.0, 4.0, 0.05, -0.15, 115.0, 22.0, 0.12, 0.06, 0.6],
                [Rgb(245, 245, 245), Rgb(25, 25, 25), Rgb(225, 225, 225), Rgb(220, 150, 160)],
            ),
        ),
        (
            "sleepy",
            preset(
                [85.0, 44.0, 24.0, 104.0, 10.0, 0.0, -0.05, 0.05, 110.0, 18.0, -0.1, 0.04, 0.4],
                [Rgb(235, 235, 235), Rgb(20, 20, 20), Rgb(215, 215, 215), Rgb(200, 140, 150)],
            ),
        ),
        (
            "angry",
            preset(
                [90.0, 44.0, 34.0, 94.0, 12.0, -2.0, -0.15, 0.25, 125.0, 24.0, -0.25, 0.09, 0.75],
                [Rgb(240, 230, 230), Rgb(30, 10, 10), Rgb(220, 200, 200), Rgb(255, 120, 120)],
            ),
        ),
        (
            "scared",
            preset(
                [90.0, 46.0, 42.0, 92.0, 10.0, -3.0, 0.2, 0.1, 125.0, 22.0, -0.35, 0.14, 0.85],
                [Rgb(240, 240, 245), Rgb(15, 15, 20), Rgb(225, 225, 235), Rgb(240, 150, 180)],
            ),
        ),
        (
            "playful",
            preset(
                [94.0, 44.0, 38.0, 94.0, 13.0, 5.0, 0.1, -0.12, 135.0, 26.0, 0.28, 0.12, 0.8],
                [Rgb(250, 250, 250), Rgb(15, 15, 15), Rgb(235, 235, 235), Rgb(255, 170, 140)],
            ),
        ),
        (
            "lonely",
            preset(
                [82.0, 42.0, 34.0, 100.0, 11.0, -1.0, -0.08, 0.1, 112.0, 20.0, -0.2, 0.05, 0.6],
                [Rgb(235, 235, 240), Rgb(15, 15, 20), Rgb(215, 215, 225), Rgb(205, 140, 170)],
            ),
        ),
        (
            "bored",
            preset(
                [90.0, 42.0, 30.0, 102.0, 11.0, 0.0, -0.02, 0.0, 118.0, 18.0, -0.05, 0.04, 0.45],
                [Rgb(240, 240, 240), Rgb(20, 20, 20), Rgb(220, 220, 220), Rgb(200, 140, 150)],
            ),
        ),
        (
            "surprised",
            preset(
                [92.0, 46.0, 44.0, 92.0, 11.0, 0.0, 0.18, 0.02, 118.0, 26.0, 0.12, 0.2, 0.9],
                [Rgb(250, 250, 250), Rgb(15, 15, 15), Rgb(240, 240, 240), Rgb(240, 160, 180)],
            ),
        ),
        (
            "loving",
            preset(
                [90.0, 44.0, 38.0, 95.0, 12.0, 3.0, 0.15, -0.05, 130.0, 26.0, 0.32, 0.12, 0.75],
                [Rgb(245, 245, 245), Rgb(20, 20, 20), Rgb(230, 230, 230), Rgb(255, 150, 170)],
            ),
        ),
    ]
}
