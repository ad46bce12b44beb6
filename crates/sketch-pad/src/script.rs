/// Editor commands read from a JSON script and the session that runs them.
use std::collections::HashMap;
use std::io::Read;
use std::path::Path as FsPath;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use sketch_pad_config::HexColor;
use sketch_pad_core::{Editor, NewShape, Path, Point, ShapeId, ShapePatch, ToolController, ToolKind};

/// One step of a script, tagged by `op`.
///
/// Shapes are addressed by the `name` given when they were created, or by
/// their id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Create {
        #[serde(default)]
        name: Option<String>,
        shape: NewShape,
    },
    Update {
        target: String,
        patch: ShapePatch,
    },
    Remove {
        target: String,
    },
    Set {
        path: Path,
        value: Value,
    },
    Unset {
        path: Path,
    },
    Select {
        #[serde(default)]
        targets: Vec<String>,
    },
    Tool {
        tool: ToolKind,
    },
    Down {
        x: f64,
        y: f64,
    },
    Move {
        x: f64,
        y: f64,
    },
    Up {
        x: f64,
        y: f64,
    },
    StrokeColor {
        color: HexColor,
        #[serde(default)]
        selected: bool,
    },
    Pan {
        dx: f64,
        dy: f64,
    },
    Undo,
    Redo,
    Begin,
    Commit,
    Rollback,
}

/// Parses a JSON array of commands.
pub fn parse_script(text: &str) -> Result<Vec<Command>> {
    serde_json::from_str(text).context("Script must be a JSON array of commands")
}

/// Reads a script from `path`, or from stdin when `path` is `None`.
pub fn read_script(path: Option<&FsPath>) -> Result<Vec<Command>> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read script from stdin")?;
            text
        }
    };
    parse_script(&text)
}

/// An editor, its tool controller, and the names given to shapes.
pub struct Session {
    editor: Editor,
    tools: ToolController,
    names: HashMap<String, ShapeId>,
}

impl Session {
    pub fn new(editor: Editor) -> Self {
        Self {
            editor,
            tools: ToolController::new(),
            names: HashMap::new(),
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn execute(&mut self, command: Command) -> Result<()> {
        tracing::debug!("Executing {command:?}");
        let ed = &mut self.editor;
        match command {
            Command::Create { name, shape } => {
                let id = ed.create_entity(shape)?;
                if let Some(name) = name {
                    self.names.insert(name, id);
                }
            }
            Command::Update { target, patch } => {
                let id = self.resolve(&target)?;
                self.editor.update_entity(id, &patch)?;
            }
            Command::Remove { target } => {
                let id = self.resolve(&target)?;
                self.editor.remove_entity(id)?;
            }
            Command::Set { path, value } => ed.set_field(&path, value)?,
            Command::Unset { path } => ed.remove_field(&path)?,
            Command::Select { targets } => {
                let ids = targets
                    .iter()
                    .map(|t| self.resolve(t))
                    .collect::<Result<Vec<_>>>()?;
                self.editor.set_selection(ids)?;
            }
            Command::Tool { tool } => self.tools.set_tool(ed, tool)?,
            Command::Down { x, y } => self.tools.pointer_down(ed, Point::new(x, y))?,
            Command::Move { x, y } => self.tools.pointer_move(ed, Point::new(x, y))?,
            Command::Up { x, y } => self.tools.pointer_up(ed, Point::new(x, y))?,
            Command::StrokeColor { color, selected: true } => ed.set_style_for_selected(color)?,
            Command::StrokeColor { color, selected: false } => ed.set_style_for_next_shapes(color)?,
            Command::Pan { dx, dy } => ed.pan(dx, dy)?,
            Command::Undo => {
                if !ed.undo()? {
                    tracing::info!("Nothing to undo");
                }
            }
            Command::Redo => {
                if !ed.redo()? {
                    tracing::info!("Nothing to redo");
                }
            }
            Command::Begin => ed.begin()?,
            Command::Commit => ed.commit()?,
            Command::Rollback => ed.rollback()?,
        }
        Ok(())
    }

    /// Runs every command in order, stopping at the first failure.
    pub fn execute_all(&mut self, commands: Vec<Command>) -> Result<()> {
        for (index, command) in commands.into_iter().enumerate() {
            self.execute(command)
                .with_context(|| format!("Command #{index} failed"))?;
        }
        if self.editor.is_in_transaction() {
            bail!("Script ended with an open transaction");
        }
        Ok(())
    }

    fn resolve(&self, target: &str) -> Result<ShapeId> {
        if let Some(id) = self.names.get(target) {
            return Ok(*id);
        }
        target
            .parse()
            .with_context(|| format!("Unknown shape {target:?}"))
    }
}
