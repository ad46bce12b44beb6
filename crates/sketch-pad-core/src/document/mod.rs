//! Typed schema of the document tree.
//!
//! The `Store` keeps the document as a JSON tree so it can be addressed by
//! path. `Document` is the typed view of that tree: it seeds a fresh store
//! and is what readers get back from `Store::document`. Field names in the
//! tree are the camelCase serde names of these types.

mod shape;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sketch_pad_config::{EngineConfig, HexColor};

use crate::error::Result;
use crate::history::ShapeId;

pub use shape::{NewShape, Shape, ShapeKind, ShapePatch};

/// The whole editor state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub camera: Camera,
    pub selection: Selection,
    /// Shape table keyed by id.
    pub shapes: BTreeMap<ShapeId, Shape>,
    pub tool: ToolState,
    pub style: Style,
    pub transform: PendingTransform,
}

impl Document {
    /// An empty document using the configured style and tool defaults.
    pub fn from_config(config: &EngineConfig) -> Self {
        let current = config.default_tool.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown default tool {:?}, using select", config.default_tool);
            ToolKind::Select
        });
        Self {
            tool: ToolState {
                current,
                ..ToolState::default()
            },
            style: Style {
                stroke_color: config.stroke_color,
                fill_color: config.fill_color,
                stroke_width: config.stroke_width,
                opacity: config.opacity,
            },
            ..Self::default()
        }
    }

    /// Reads the typed view out of a document tree.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Schema`](crate::EngineError::Schema) if the
    /// tree does not match the schema.
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Document::deserialize(value)?)
    }

    /// Serializes the document into the tree form held by the `Store`.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Selected shapes that still exist, in selection order.
    pub fn selected_shapes(&self) -> Vec<&Shape> {
        self.selection
            .ids
            .iter()
            .filter_map(|id| self.shapes.get(id))
            .collect()
    }
}

/// View transform of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    pub rotation: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub ids: Vec<ShapeId>,
}

/// Tool kinds selectable through `tool.current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Rect,
    Ellipse,
    Diamond,
    Brush,
    Eraser,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Select,
        ToolKind::Rect,
        ToolKind::Ellipse,
        ToolKind::Diamond,
        ToolKind::Brush,
        ToolKind::Eraser,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Rect => "rect",
            ToolKind::Ellipse => "ellipse",
            ToolKind::Diamond => "diamond",
            ToolKind::Brush => "brush",
            ToolKind::Eraser => "eraser",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown tool: {s}"))
    }
}

/// What the active tool is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    #[default]
    Idle,
    Drawing,
    Transforming,
    Panning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolState {
    pub current: ToolKind,
    pub locked: bool,
    pub mode: ToolMode,
}

/// Style applied to newly created shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub stroke_color: HexColor,
    pub fill_color: HexColor,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke_color: HexColor::BLACK,
            fill_color: HexColor::TRANSPARENT,
            stroke_width: 2.0,
            opacity: 1.0,
        }
    }
}

/// Translation of the shapes being dragged that has not been applied to
/// them yet. Renderers use it to preview the drag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PendingTransform {
    pub ids: Vec<ShapeId>,
    pub dx: f64,
    pub dy: f64,
}

impl PendingTransform {
    pub fn is_active(&self) -> bool {
        !self.ids.is_empty()
    }
}
