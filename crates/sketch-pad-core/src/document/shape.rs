//! Shape entries of the `shapes` section and the payloads used to create
//! and patch them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sketch_pad_config::HexColor;

use crate::error::Result;
use crate::geometry::{Bounds, Point};
use crate::history::ShapeId;

use super::Style;

/// Rendering discriminator of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    Ellipse,
    Diamond,
    /// Freehand brush stroke.
    Line,
    /// Freehand stroke painted with the eraser.
    Eraser,
}

impl ShapeKind {
    /// Whether the geometry is described by `points` rather than the box.
    pub fn is_stroke(self) -> bool {
        matches!(self, ShapeKind::Line | ShapeKind::Eraser)
    }
}

fn one() -> f64 {
    1.0
}

/// One entry of the shape table.
///
/// Stroke points are stored flat (`[x0, y0, x1, y1, ...]`) and relative to
/// `x`/`y`, so moving a stroke only touches two fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    #[serde(default)]
    pub points: Vec<f64>,
    pub stroke: HexColor,
    pub fill: HexColor,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Shape {
    /// Stroke points in canvas coordinates.
    pub fn absolute_points(&self) -> Vec<Point> {
        self.points
            .chunks_exact(2)
            .map(|pair| Point::new(self.x + pair[0], self.y + pair[1]))
            .collect()
    }

    /// Axis-aligned bounding box, ignoring rotation.
    pub fn bounds(&self) -> Bounds {
        let origin = Point::new(self.x, self.y);
        if self.kind.is_stroke() {
            return Bounds::from_points(self.absolute_points())
                .unwrap_or_else(|| Bounds::from_corners(origin, origin))
                .inflate(self.stroke_width / 2.0);
        }
        let far = Point::new(
            self.x + self.width * self.scale_x,
            self.y + self.height * self.scale_y,
        );
        Bounds::from_corners(origin, far)
    }
}

/// Description of a shape to create. Style fields left as `None` are taken
/// from the document style at creation time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShape {
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub points: Vec<f64>,
    pub stroke: Option<HexColor>,
    pub fill: Option<HexColor>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
}

impl NewShape {
    pub fn new(kind: ShapeKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            kind,
            x,
            y,
            width,
            height,
            points: Vec::new(),
            stroke: None,
            fill: None,
            stroke_width: None,
            opacity: None,
        }
    }

    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Rect, x, y, width, height)
    }

    pub fn ellipse(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Ellipse, x, y, width, height)
    }

    pub fn diamond(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Diamond, x, y, width, height)
    }

    /// A stroke anchored at `start`, holding that single point.
    pub fn stroke(kind: ShapeKind, start: Point) -> Self {
        Self {
            points: vec![0.0, 0.0],
            ..Self::new(kind, start.x, start.y, 0.0, 0.0)
        }
    }

    pub fn with_stroke(mut self, color: HexColor) -> Self {
        self.stroke = Some(color);
        self
    }

    pub fn with_fill(mut self, color: HexColor) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn into_shape(self, id: ShapeId, style: &Style) -> Shape {
        Shape {
            id,
            kind: self.kind,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            points: self.points,
            stroke: self.stroke.unwrap_or(style.stroke_color),
            fill: self.fill.unwrap_or(style.fill_color),
            stroke_width: self.stroke_width.unwrap_or(style.stroke_width),
            opacity: self.opacity.unwrap_or(style.opacity),
        }
    }
}

/// Partial update of a shape. Each `Some` field becomes one write at
/// `shapes.<id>.<field>`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub points: Option<Vec<f64>>,
    pub stroke: Option<HexColor>,
    pub fill: Option<HexColor>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
}

impl ShapePatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Position and size from a (normalized) rectangle.
    pub fn frame(bounds: Bounds) -> Self {
        Self {
            x: Some(bounds.min_x),
            y: Some(bounds.min_y),
            width: Some(bounds.width()),
            height: Some(bounds.height()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// The `(field name, value)` writes this patch stands for, in a fixed
    /// field order.
    pub fn to_fields(&self) -> Result<Vec<(&'static str, Value)>> {
        fn push<T: Serialize>(
            out: &mut Vec<(&'static str, Value)>,
            name: &'static str,
            value: &Option<T>,
        ) -> Result<()> {
            if let Some(value) = value {
                out.push((name, serde_json::to_value(value)?));
            }
            Ok(())
        }

        let mut fields = Vec::new();
        push(&mut fields, "x", &self.x)?;
        push(&mut fields, "y", &self.y)?;
        push(&mut fields, "width", &self.width)?;
        push(&mut fields, "height", &self.height)?;
        push(&mut fields, "rotation", &self.rotation)?;
        push(&mut fields, "scaleX", &self.scale_x)?;
        push(&mut fields, "scaleY", &self.scale_y)?;
        push(&mut fields, "points", &self.points)?;
        push(&mut fields, "stroke", &self.stroke)?;
        push(&mut fields, "fill", &self.fill)?;
        push(&mut fields, "strokeWidth", &self.stroke_width)?;
        push(&mut fields, "opacity", &self.opacity)?;
        Ok(fields)
    }
}
