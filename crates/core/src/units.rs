//! Length unit conversions.
//!
//! Package geometry is stored in EMUs (English Metric Units, 914400 per
//! inch). Rendering works in CSS pixels (96 per inch) multiplied by the
//! supersampling scale; pages are sized in PDF points (72 per inch).

/// EMUs per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// CSS pixels per inch.
pub const PX_PER_INCH: f64 = 96.0;

/// PDF points per inch.
pub const PT_PER_INCH: f64 = 72.0;

/// Pixels per typographic point.
pub const PT_TO_PX: f32 = 96.0 / 72.0;

/// Convert an EMU length to pixels at the given scale.
pub fn emu_to_px(emu: i64, scale: f32) -> f32 {
    (emu as f64 / EMU_PER_INCH * PX_PER_INCH) as f32 * scale
}

/// Convert an EMU length to PDF points.
pub fn emu_to_pt(emu: i64) -> f32 {
    (emu as f64 / EMU_PER_INCH * PT_PER_INCH) as f32
}

/// Convert a point size to pixels at the given scale.
pub fn pt_to_px(pt: f32, scale: f32) -> f32 {
    pt * PT_TO_PX * scale
}

/// Convert an angle in 1/60000 degree (the `rot` attribute unit) to radians.
pub fn angle_to_radians(angle: i64) -> f32 {
    ((angle as f64 / 60_000.0).to_radians()) as f32
}
