//! Selection tool: dragging selected shapes and marquee selection.
//!
//! While dragging, only `transform.dx/dy` change; the shapes themselves are
//! moved once on pointer-up. The transform and tool mode go back to their
//! resting values in the same transaction, so the history entry holds just
//! the shape moves.

use crate::document::{ShapePatch, ToolMode};
use crate::editor::Editor;
use crate::error::Result;
use crate::geometry::{Bounds, Point};
use crate::history::{Field, ShapeId};

use super::Gesture;

pub(super) fn down(editor: &mut Editor, point: Point) -> Result<Gesture> {
    let selected = editor.selected_shapes()?;
    if !selected.iter().any(|s| s.bounds().contains(point)) {
        return Ok(Gesture::Marquee {
            start: point,
            current: point,
        });
    }

    let ids: Vec<ShapeId> = selected.iter().map(|s| s.id).collect();
    super::begin(editor)?;
    editor.write_field(Field::ToolMode, serde_json::to_value(ToolMode::Transforming)?)?;
    editor.write_field(Field::TransformIds, serde_json::to_value(&ids)?)?;
    Ok(Gesture::Drag { ids, start: point })
}

pub(super) fn drag(editor: &mut Editor, start: Point, point: Point) -> Result<()> {
    let (dx, dy) = point.delta_from(start);
    editor.write_field(Field::TransformDx, serde_json::to_value(dx)?)?;
    editor.write_field(Field::TransformDy, serde_json::to_value(dy)?)
}

pub(super) fn drop_selection(editor: &mut Editor, ids: &[ShapeId], start: Point, point: Point) -> Result<()> {
    let (dx, dy) = point.delta_from(start);
    if dx != 0.0 || dy != 0.0 {
        let mut moves = Vec::with_capacity(ids.len());
        for id in ids {
            let shape = editor.shape(*id)?;
            moves.push((*id, ShapePatch::position(shape.x + dx, shape.y + dy)));
        }
        editor.update_entities(&moves)?;
    }
    editor.write_field(Field::TransformIds, serde_json::to_value(Vec::<ShapeId>::new())?)?;
    editor.write_field(Field::TransformDx, serde_json::to_value(0.0)?)?;
    editor.write_field(Field::TransformDy, serde_json::to_value(0.0)?)?;
    editor.write_field(Field::ToolMode, serde_json::to_value(ToolMode::Idle)?)
}

/// Selects every shape whose bounds intersect the marquee.
pub(super) fn select_marquee(editor: &mut Editor, start: Point, end: Point) -> Result<()> {
    let area = Bounds::from_corners(start, end);
    let hits: Vec<ShapeId> = editor
        .document()?
        .shapes
        .values()
        .filter(|shape| shape.bounds().intersects(&area))
        .map(|shape| shape.id)
        .collect();
    editor.set_selection(hits)
}
