//! Handwritten signature capture.
//!
//! A [`SignaturePad`] replays pointer events onto a fixed-size surface and
//! renders the strokes as an SVG image data URL.

use core::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Pen colour.
const STROKE_COLOR: &str = "#1a1a2e";
/// Pen width in surface units.
const STROKE_WIDTH: f64 = 2.0;

/// Errors from the signature pad.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SignatureError {
    /// No drawing surface, or one with zero area.
    #[error("signature surface is missing or has no area")]
    MissingSurface,
    /// Nothing has been drawn.
    #[error("signature is empty")]
    Empty,
    /// A coordinate is NaN or infinite.
    #[error("pointer position ({x}, {y}) is not a finite number")]
    InvalidPoint {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
    },
}

/// Size of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
}

/// What the pointer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
}

/// Which device produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerDevice {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// One pointer event in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    #[serde(default)]
    pub device: PointerDevice,
    pub x: f64,
    pub y: f64,
}

/// A point inside the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Collects strokes and renders them.
#[derive(Debug, Clone)]
pub struct SignaturePad {
    surface: Surface,
    strokes: Vec<Vec<Point>>,
    drawing: bool,
    has_content: bool,
}

impl SignaturePad {
    /// Attach a pad to `surface`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::MissingSurface`] when there is no surface
    /// or its width or height is not positive.
    pub fn attach(surface: Option<Surface>) -> Result<Self, SignatureError> {
        let surface = surface
            .filter(|s| s.width.is_finite() && s.height.is_finite())
            .filter(|s| s.width > 0.0 && s.height > 0.0)
            .ok_or(SignatureError::MissingSurface)?;
        Ok(Self {
            surface,
            strokes: Vec::new(),
            drawing: false,
            has_content: false,
        })
    }

    /// Whether any point has been recorded.
    #[must_use]
    pub const fn has_content(&self) -> bool {
        self.has_content
    }

    /// Recorded strokes.
    #[must_use]
    pub fn strokes(&self) -> &[Vec<Point>] {
        &self.strokes
    }

    /// Feed one pointer event.
    ///
    /// Moves outside a stroke are ignored. `Up`, `Cancel` and `Leave` end
    /// the current stroke.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidPoint`] for non-finite coordinates.
    pub fn handle(&mut self, event: PointerEvent) -> Result<(), SignatureError> {
        match event.phase {
            PointerPhase::Down => {
                let point = self.clamp(event.x, event.y)?;
                self.strokes.push(vec![point]);
                self.drawing = true;
                self.has_content = true;
            }
            PointerPhase::Move if self.drawing => {
                let point = self.clamp(event.x, event.y)?;
                if let Some(stroke) = self.strokes.last_mut() {
                    if stroke.last() != Some(&point) {
                        stroke.push(point);
                    }
                }
            }
            PointerPhase::Move => {}
            PointerPhase::Up | PointerPhase::Cancel | PointerPhase::Leave => {
                self.drawing = false;
            }
        }
        Ok(())
    }

    /// Feed a sequence of events, stopping at the first bad one.
    ///
    /// # Errors
    ///
    /// Returns the first [`SignatureError`] raised by [`Self::handle`].
    pub fn replay<I>(&mut self, events: I) -> Result<(), SignatureError>
    where
        I: IntoIterator<Item = PointerEvent>,
    {
        events.into_iter().try_for_each(|event| self.handle(event))
    }

    /// Erase everything.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
        self.has_content = false;
    }

    /// Render the strokes as an SVG document.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Empty`] when nothing was drawn.
    pub fn to_svg(&self) -> Result<String, SignatureError> {
        if !self.has_content {
            return Err(SignatureError::Empty);
        }
        let Surface { width, height } = self.surface;
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        for stroke in &self.strokes {
            match stroke.as_slice() {
                [] => {}
                [dot] => {
                    let _ = write!(
                        svg,
                        r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{STROKE_COLOR}"/>"#,
                        dot.x,
                        dot.y,
                        STROKE_WIDTH / 2.0
                    );
                }
                points => {
                    svg.push_str(r#"<polyline points=""#);
                    for (i, p) in points.iter().enumerate() {
                        if i > 0 {
                            svg.push(' ');
                        }
                        let _ = write!(svg, "{:.1},{:.1}", p.x, p.y);
                    }
                    let _ = write!(
                        svg,
                        r#"" fill="none" stroke="{STROKE_COLOR}" stroke-width="{STROKE_WIDTH}" stroke-linecap="round" stroke-linejoin="round"/>"#
                    );
                }
            }
        }
        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Render as a `data:image/svg+xml;base64,` URL.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Empty`] when nothing was drawn.
    pub fn to_data_url(&self) -> Result<String, SignatureError> {
        let svg = self.to_svg()?;
        Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)))
    }

    fn clamp(&self, x: f64, y: f64) -> Result<Point, SignatureError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(SignatureError::InvalidPoint { x, y });
        }
        Ok(Point {
            x: x.clamp(0.0, self.surface.width),
            y: y.clamp(0.0, self.surface.height),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pad() -> SignaturePad {
        SignaturePad::attach(Some(Surface {
            width: 300.0,
            height: 150.0,
        }))
        .unwrap()
    }

    fn ev(phase: PointerPhase, x: f64, y: f64) -> PointerEvent {
        PointerEvent {
            phase,
            device: PointerDevice::Touch,
            x,
            y,
        }
    }

    #[test]
    fn test_attach_requires_surface() {
        assert_eq!(
            SignaturePad::attach(None).unwrap_err(),
            SignatureError::MissingSurface
        );
        assert_eq!(
            SignaturePad::attach(Some(Surface {
                width: 0.0,
                height: 100.0
            }))
            .unwrap_err(),
            SignatureError::MissingSurface
        );
    }

    #[test]
    fn test_empty_pad_cannot_serialise() {
        let pad = pad();
        assert!(!pad.has_content());
        assert_eq!(pad.to_data_url(), Err(SignatureError::Empty));
    }

    #[test]
    fn test_moves_without_down_are_ignored() {
        let mut pad = pad();
        pad.handle(ev(PointerPhase::Move, 10.0, 10.0)).unwrap();
        assert!(!pad.has_content());
    }

    #[test]
    fn test_stroke_is_clamped_and_rendered() {
        let mut pad = pad();
        pad.replay([
            ev(PointerPhase::Down, 10.0, 10.0),
            ev(PointerPhase::Move, 50.0, 20.0),
            ev(PointerPhase::Move, 400.0, -5.0),
            ev(PointerPhase::Leave, 400.0, -5.0),
            ev(PointerPhase::Move, 80.0, 80.0),
        ])
        .unwrap();

        assert!(pad.has_content());
        assert_eq!(pad.strokes().len(), 1);
        assert_eq!(pad.strokes()[0].last(), Some(&Point { x: 300.0, y: 0.0 }));

        let svg = pad.to_svg().unwrap();
        assert!(svg.contains("10.0,10.0 50.0,20.0 300.0,0.0"));
        assert!(pad.to_data_url().unwrap().starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_tap_renders_a_dot() {
        let mut pad = pad();
        pad.replay([
            ev(PointerPhase::Down, 5.0, 5.0),
            ev(PointerPhase::Up, 5.0, 5.0),
        ])
        .unwrap();
        assert!(pad.to_svg().unwrap().contains("<circle"));
    }

    #[test]
    fn test_clear_resets_content() {
        let mut pad = pad();
        pad.handle(ev(PointerPhase::Down, 1.0, 1.0)).unwrap();
        pad.clear();
        assert!(!pad.has_content());
        assert!(pad.strokes().is_empty());
    }

    #[test]
    fn test_non_finite_point_is_rejected() {
        let mut pad = pad();
        assert!(matches!(
            pad.handle(ev(PointerPhase::Down, f64::NAN, 1.0)),
            Err(SignatureError::InvalidPoint { .. })
        ));
        assert!(!pad.has_content());
    }

    #[test]
    fn test_events_deserialise_from_json() {
        let events: Vec<PointerEvent> = serde_json::from_str(
            r#"[{"phase":"down","device":"pen","x":1,"y":2},{"phase":"up","x":1,"y":2}]"#,
        )
        .unwrap();
        assert_eq!(events[0].device, PointerDevice::Pen);
        assert_eq!(events[1].device, PointerDevice::Mouse);
    }
}
