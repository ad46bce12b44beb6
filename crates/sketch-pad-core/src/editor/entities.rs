//! Shape and section operations built on top of the transaction boundary.

use serde_json::Value;
use sketch_pad_config::HexColor;

use crate::document::{Camera, NewShape, Shape, ShapePatch, Style, ToolKind};
use crate::error::Result;
use crate::history::{Field, Path, Section, ShapeId};

use super::Editor;

impl Editor {
    /// Adds a shape styled from the document style and returns its id.
    pub fn create_entity(&mut self, shape: NewShape) -> Result<ShapeId> {
        self.run(|ed| ed.insert_shape(shape))
    }

    /// Adds several shapes as one undoable unit.
    pub fn create_entities(&mut self, shapes: Vec<NewShape>) -> Result<Vec<ShapeId>> {
        self.run(|ed| shapes.into_iter().map(|shape| ed.insert_shape(shape)).collect())
    }

    fn insert_shape(&mut self, new: NewShape) -> Result<ShapeId> {
        let style: Style = self.section(Section::Style)?;
        let id = ShapeId::new();
        let shape = new.into_shape(id, &style);
        self.write(&Path::Shape(id), serde_json::to_value(&shape)?)?;
        Ok(id)
    }

    /// Applies `patch` to an existing shape.
    ///
    /// # Errors
    ///
    /// [`EngineError::PathNotFound`](crate::EngineError::PathNotFound) if the
    /// shape does not exist; nothing is written in that case.
    pub fn update_entity(&mut self, id: ShapeId, patch: &ShapePatch) -> Result<()> {
        self.run(|ed| ed.patch_shape(id, patch))
    }

    pub fn update_entities(&mut self, updates: &[(ShapeId, ShapePatch)]) -> Result<()> {
        self.run(|ed| {
            for (id, patch) in updates {
                ed.patch_shape(*id, patch)?;
            }
            Ok(())
        })
    }

    fn patch_shape(&mut self, id: ShapeId, patch: &ShapePatch) -> Result<()> {
        self.store.get(&Path::Shape(id))?;
        for (name, value) in patch.to_fields()? {
            self.write(&Path::shape_field(id, name)?, value)?;
        }
        Ok(())
    }

    /// Deletes a shape and drops it from the selection.
    pub fn remove_entity(&mut self, id: ShapeId) -> Result<()> {
        self.run(|ed| ed.delete_shape(id))
    }

    pub fn remove_entities(&mut self, ids: &[ShapeId]) -> Result<()> {
        self.run(|ed| {
            for id in ids {
                ed.delete_shape(*id)?;
            }
            Ok(())
        })
    }

    fn delete_shape(&mut self, id: ShapeId) -> Result<()> {
        self.delete(&Path::Shape(id))?;
        let selection: Vec<ShapeId> = self.read(&Path::Field(Field::SelectionIds))?;
        if selection.contains(&id) {
            let kept: Vec<ShapeId> = selection.into_iter().filter(|s| *s != id).collect();
            self.write(&Path::Field(Field::SelectionIds), serde_json::to_value(kept)?)?;
        }
        Ok(())
    }

    pub fn shape(&self, id: ShapeId) -> Result<Shape> {
        self.read(&Path::Shape(id))
    }

    pub fn selection(&self) -> Result<Vec<ShapeId>> {
        self.read(&Path::Field(Field::SelectionIds))
    }

    pub fn set_selection(&mut self, ids: Vec<ShapeId>) -> Result<()> {
        self.set_field(&Path::Field(Field::SelectionIds), serde_json::to_value(ids)?)
    }

    /// Selected shapes that still exist, in selection order.
    pub fn selected_shapes(&self) -> Result<Vec<Shape>> {
        let mut shapes = Vec::new();
        for id in self.selection()? {
            if self.store.contains(&Path::Shape(id)) {
                shapes.push(self.shape(id)?);
            }
        }
        Ok(shapes)
    }

    /// Sets the stroke color of the selected shapes and of shapes drawn
    /// next, as one undoable unit.
    pub fn set_style_for_selected(&mut self, color: HexColor) -> Result<()> {
        self.run(|ed| {
            ed.write(&Path::Field(Field::StyleStrokeColor), serde_json::to_value(color)?)?;
            let patch = ShapePatch {
                stroke: Some(color),
                ..ShapePatch::default()
            };
            for shape in ed.selected_shapes()? {
                ed.patch_shape(shape.id, &patch)?;
            }
            Ok(())
        })
    }

    /// Sets the stroke color used for shapes drawn from now on.
    pub fn set_style_for_next_shapes(&mut self, color: HexColor) -> Result<()> {
        self.set_field(&Path::Field(Field::StyleStrokeColor), serde_json::to_value(color)?)
    }

    pub fn style(&self) -> Result<Style> {
        self.section(Section::Style)
    }

    /// Switches the active tool without touching history.
    pub fn set_tool(&mut self, kind: ToolKind) -> Result<()> {
        self.run_untracked(|ed| ed.write(&Path::Field(Field::ToolCurrent), serde_json::to_value(kind)?))
    }

    pub fn current_tool(&self) -> Result<ToolKind> {
        self.read(&Path::Field(Field::ToolCurrent))
    }

    pub fn camera(&self) -> Result<Camera> {
        self.section(Section::Camera)
    }

    /// Moves the view without touching history.
    pub fn set_camera(&mut self, camera: Camera) -> Result<()> {
        self.run_untracked(|ed| ed.write(&Path::Section(Section::Camera), serde_json::to_value(camera)?))
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<()> {
        let camera = self.camera()?;
        self.set_camera(Camera {
            x: camera.x + dx,
            y: camera.y + dy,
            ..camera
        })
    }

    /// Writes one field of the selection/transform/tool sections inside the
    /// active transaction. Used by tools while a gesture is open.
    pub(crate) fn write_field(&mut self, field: Field, value: Value) -> Result<()> {
        self.write(&Path::Field(field), value)
    }
}
