//! Rectangle, ellipse and diamond tools.

use crate::document::{NewShape, ShapeKind, ShapePatch, ToolMode};
use crate::editor::Editor;
use crate::error::Result;
use crate::geometry::{Bounds, Point};
use crate::history::{Field, ShapeId};

use super::Gesture;

pub(super) fn down(editor: &mut Editor, kind: ShapeKind, start: Point) -> Result<Gesture> {
    super::begin(editor)?;
    editor.write_field(Field::ToolMode, serde_json::to_value(ToolMode::Drawing)?)?;
    let id = editor.create_entity(NewShape::new(kind, start.x, start.y, 0.0, 0.0))?;
    Ok(Gesture::Shape { id, start })
}

pub(super) fn resize(editor: &mut Editor, id: ShapeId, start: Point, point: Point) -> Result<()> {
    editor.update_entity(id, &ShapePatch::frame(Bounds::from_corners(start, point)))
}

pub(super) fn finish(editor: &mut Editor, id: ShapeId, start: Point, point: Point) -> Result<()> {
    resize(editor, id, start, point)?;
    editor.write_field(Field::ToolMode, serde_json::to_value(ToolMode::Idle)?)
}
