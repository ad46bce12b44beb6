//! Pointer-driven tools.
//!
//! A `ToolController` turns pointer events into editor operations for the
//! tool selected in `tool.current`. Gestures that change the document open
//! a transaction on pointer-down and commit it on pointer-up, so each drag
//! becomes a single history entry. When the caller already holds a
//! transaction the gesture joins it instead, and closing it is left to the
//! caller.

mod select;
mod shape;
mod stroke;

use crate::document::{ShapeKind, ToolKind};
use crate::editor::Editor;
use crate::error::Result;
use crate::geometry::Point;
use crate::history::ShapeId;

/// State of the gesture in progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Sizing a box shape from `start` to the pointer.
    Shape { id: ShapeId, start: Point },
    /// Freehand stroke; `points` mirrors the stored point list.
    Stroke { id: ShapeId, origin: Point, points: Vec<f64> },
    /// Dragging the selected shapes.
    Drag { ids: Vec<ShapeId>, start: Point },
    /// Rubber-band selection.
    Marquee { start: Point, current: Point },
}

#[derive(Debug, Default)]
pub struct ToolController {
    gesture: Gesture,
    /// The gesture's transaction was opened here, not by the caller.
    owns_tx: bool,
}

impl ToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    pub fn pointer_down(&mut self, editor: &mut Editor, point: Point) -> Result<()> {
        if !self.is_idle() {
            tracing::debug!("Pointer down during {:?}, cancelling it", self.gesture);
            self.cancel(editor)?;
        }
        let joined = editor.is_in_transaction();
        let gesture = match editor.current_tool()? {
            ToolKind::Select => select::down(editor, point),
            ToolKind::Rect => shape::down(editor, ShapeKind::Rect, point),
            ToolKind::Ellipse => shape::down(editor, ShapeKind::Ellipse, point),
            ToolKind::Diamond => shape::down(editor, ShapeKind::Diamond, point),
            ToolKind::Brush => stroke::down(editor, ShapeKind::Line, point),
            ToolKind::Eraser => stroke::down(editor, ShapeKind::Eraser, point),
        };
        self.owns_tx = !joined && editor.is_in_transaction();
        self.gesture = self.abandon_on_error(editor, gesture)?;
        Ok(())
    }

    pub fn pointer_move(&mut self, editor: &mut Editor, point: Point) -> Result<()> {
        let result = match &mut self.gesture {
            Gesture::Idle => Ok(()),
            Gesture::Shape { id, start } => shape::resize(editor, *id, *start, point),
            Gesture::Stroke { id, origin, points } => stroke::extend(editor, *id, *origin, points, point),
            Gesture::Drag { start, .. } => select::drag(editor, *start, point),
            Gesture::Marquee { current, .. } => {
                *current = point;
                Ok(())
            }
        };
        if result.is_err() {
            self.gesture = Gesture::Idle;
        }
        self.abandon_on_error(editor, result)
    }

    pub fn pointer_up(&mut self, editor: &mut Editor, point: Point) -> Result<()> {
        let result = match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Ok(()),
            Gesture::Shape { id, start } => shape::finish(editor, id, start, point),
            Gesture::Stroke { id, origin, mut points } => stroke::finish(editor, id, origin, &mut points, point),
            Gesture::Drag { ids, start } => select::drop_selection(editor, &ids, start, point),
            Gesture::Marquee { start, .. } => select::select_marquee(editor, start, point),
        };
        let result = match result {
            Ok(()) => self.close(editor),
            Err(err) => Err(err),
        };
        self.abandon_on_error(editor, result)
    }

    /// Switches tools, rolling back any gesture in progress.
    pub fn set_tool(&mut self, editor: &mut Editor, kind: ToolKind) -> Result<()> {
        self.cancel(editor)?;
        editor.set_tool(kind)
    }

    /// Abandons the gesture in progress and reverts what it wrote.
    ///
    /// A gesture that joined the caller's transaction leaves its writes in
    /// that transaction; the caller's rollback reverts them.
    pub fn cancel(&mut self, editor: &mut Editor) -> Result<()> {
        self.gesture = Gesture::Idle;
        if std::mem::take(&mut self.owns_tx) && editor.is_in_transaction() {
            editor.rollback()?;
        }
        Ok(())
    }

    /// Commits the gesture's transaction if it was opened here.
    fn close(&mut self, editor: &mut Editor) -> Result<()> {
        if std::mem::take(&mut self.owns_tx) {
            editor.commit()?;
        }
        Ok(())
    }

    /// Rolls back the gesture's own transaction when one of its steps
    /// failed. The caller's transaction is never touched.
    fn abandon_on_error<T>(&mut self, editor: &mut Editor, result: Result<T>) -> Result<T> {
        if result.is_err() && std::mem::take(&mut self.owns_tx) && editor.is_in_transaction() {
            if let Err(err) = editor.rollback() {
                tracing::warn!("Could not roll back failed gesture: {err}");
            }
        }
        result
    }
}

/// Opens a transaction for the gesture unless the caller already holds one.
fn begin(editor: &mut Editor) -> Result<()> {
    if editor.is_in_transaction() {
        return Ok(());
    }
    editor.begin()
}
