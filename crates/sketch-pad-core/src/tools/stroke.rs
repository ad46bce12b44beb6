//! Brush and eraser tools: freehand strokes built point by point.

use crate::document::{NewShape, ShapeKind, ShapePatch, ToolMode};
use crate::editor::Editor;
use crate::error::Result;
use crate::geometry::Point;
use crate::history::{Field, ShapeId};

use super::Gesture;

pub(super) fn down(editor: &mut Editor, kind: ShapeKind, origin: Point) -> Result<Gesture> {
    super::begin(editor)?;
    editor.write_field(Field::ToolMode, serde_json::to_value(ToolMode::Drawing)?)?;
    let mut stroke = NewShape::stroke(kind, origin);
    if kind == ShapeKind::Eraser {
        stroke = stroke.with_stroke_width(editor.config().eraser_width);
    }
    let points = stroke.points.clone();
    let id = editor.create_entity(stroke)?;
    Ok(Gesture::Stroke { id, origin, points })
}

/// Appends `point` (made relative to the stroke origin) and stores the
/// whole point list.
pub(super) fn extend(
    editor: &mut Editor,
    id: ShapeId,
    origin: Point,
    points: &mut Vec<f64>,
    point: Point,
) -> Result<()> {
    let (dx, dy) = point.delta_from(origin);
    if points.ends_with(&[dx, dy]) {
        return Ok(());
    }
    points.extend([dx, dy]);
    let patch = ShapePatch {
        points: Some(points.clone()),
        ..ShapePatch::default()
    };
    editor.update_entity(id, &patch)
}

pub(super) fn finish(
    editor: &mut Editor,
    id: ShapeId,
    origin: Point,
    points: &mut Vec<f64>,
    point: Point,
) -> Result<()> {
    extend(editor, id, origin, points, point)?;
    editor.write_field(Field::ToolMode, serde_json::to_value(ToolMode::Idle)?)
}
