/// Structured addresses into the document tree.
///
/// A [`Path`] is a closed set of shapes: the root, a section, a known field
/// of a section, a shape entry, or a per-shape sub-field. Only the last one
/// carries a free-form name, and that name is validated when the path is
/// built. Paths display as dotted strings (`shapes.<id>.strokeWidth`) and
/// parse back from them.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced while building or parsing a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("unknown section: {0:?}")]
    UnknownSection(String),
    #[error("section {section} has no field {field:?}")]
    UnknownField { section: Section, field: String },
    #[error("invalid shape id: {0:?}")]
    InvalidShapeId(String),
    #[error("invalid field name: {0:?}")]
    InvalidFieldName(String),
    #[error("path is nested too deeply: {0:?}")]
    TooDeep(String),
}

/// Top-level sections of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Camera,
    Selection,
    Shapes,
    Tool,
    Style,
    Transform,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Camera,
        Section::Selection,
        Section::Shapes,
        Section::Tool,
        Section::Style,
        Section::Transform,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Camera => "camera",
            Section::Selection => "selection",
            Section::Shapes => "shapes",
            Section::Tool => "tool",
            Section::Style => "style",
            Section::Transform => "transform",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Known fields of this section. Empty for `shapes`, which is keyed by id.
    pub fn fields(self) -> &'static [Field] {
        use Field::*;
        match self {
            Section::Camera => &[CameraX, CameraY, CameraZoom, CameraRotation],
            Section::Selection => &[SelectionIds],
            Section::Shapes => &[],
            Section::Tool => &[ToolCurrent, ToolLocked, ToolMode],
            Section::Style => &[StyleStrokeColor, StyleFillColor, StyleStrokeWidth, StyleOpacity],
            Section::Transform => &[TransformIds, TransformDx, TransformDy],
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known field of a fixed section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    CameraX,
    CameraY,
    CameraZoom,
    CameraRotation,
    SelectionIds,
    ToolCurrent,
    ToolLocked,
    ToolMode,
    StyleStrokeColor,
    StyleFillColor,
    StyleStrokeWidth,
    StyleOpacity,
    TransformIds,
    TransformDx,
    TransformDy,
}

impl Field {
    pub fn section(self) -> Section {
        use Field::*;
        match self {
            CameraX | CameraY | CameraZoom | CameraRotation => Section::Camera,
            SelectionIds => Section::Selection,
            ToolCurrent | ToolLocked | ToolMode => Section::Tool,
            StyleStrokeColor | StyleFillColor | StyleStrokeWidth | StyleOpacity => Section::Style,
            TransformIds | TransformDx | TransformDy => Section::Transform,
        }
    }

    /// Name of the field inside its section, as stored in the document.
    pub fn name(self) -> &'static str {
        use Field::*;
        match self {
            CameraX => "x",
            CameraY => "y",
            CameraZoom => "zoom",
            CameraRotation => "rotation",
            SelectionIds | TransformIds => "ids",
            ToolCurrent => "current",
            ToolLocked => "locked",
            ToolMode => "mode",
            StyleStrokeColor => "strokeColor",
            StyleFillColor => "fillColor",
            StyleStrokeWidth => "strokeWidth",
            StyleOpacity => "opacity",
            TransformDx => "dx",
            TransformDy => "dy",
        }
    }

    pub fn parse(section: Section, name: &str) -> Result<Self, PathError> {
        section
            .fields()
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| PathError::UnknownField {
                section,
                field: name.to_string(),
            })
    }
}

/// Unique shape identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub Uuid);

impl ShapeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ShapeId {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| PathError::InvalidShapeId(s.to_string()))
    }
}

/// A validated per-shape field name: an ASCII letter followed by
/// letters, digits, or underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey(String);

impl FieldKey {
    pub fn new(name: impl Into<String>) -> Result<Self, PathError> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(Self(name))
        } else {
            Err(PathError::InvalidFieldName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of a value in the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Path {
    /// The whole document. Displays as the empty string.
    Root,
    Section(Section),
    Field(Field),
    Shape(ShapeId),
    ShapeField(ShapeId, FieldKey),
}

impl Path {
    /// `shapes.<id>.<name>`, validating `name`.
    pub fn shape_field(id: ShapeId, name: &str) -> Result<Self, PathError> {
        Ok(Path::ShapeField(id, FieldKey::new(name)?))
    }

    /// Segments from the root, e.g. `["shapes", "<id>", "x"]`. Empty for `Root`.
    pub fn segments(&self) -> Vec<String> {
        match self {
            Path::Root => Vec::new(),
            Path::Section(s) => vec![s.as_str().to_string()],
            Path::Field(f) => vec![f.section().as_str().to_string(), f.name().to_string()],
            Path::Shape(id) => vec![Section::Shapes.as_str().to_string(), id.to_string()],
            Path::ShapeField(id, key) => vec![
                Section::Shapes.as_str().to_string(),
                id.to_string(),
                key.as_str().to_string(),
            ],
        }
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        match self {
            Path::Root => 0,
            Path::Section(_) => 1,
            Path::Field(_) | Path::Shape(_) => 2,
            Path::ShapeField(..) => 3,
        }
    }

    /// The enclosing path, `None` for `Root`.
    pub fn parent(&self) -> Option<Path> {
        match self {
            Path::Root => None,
            Path::Section(_) => Some(Path::Root),
            Path::Field(f) => Some(Path::Section(f.section())),
            Path::Shape(_) => Some(Path::Section(Section::Shapes)),
            Path::ShapeField(id, _) => Some(Path::Shape(*id)),
        }
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &Path) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(p) = cursor {
            if p.depth() < self.depth() {
                return false;
            }
            if &p == self {
                return true;
            }
            cursor = p.parent();
        }
        false
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self != other && self.contains(other)
    }

    /// Whether a change at one path can affect the value at the other.
    pub fn overlaps(&self, other: &Path) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Segments of `self` below `ancestor`, or `None` if `ancestor` does
    /// not contain `self`.
    pub fn relative_to(&self, ancestor: &Path) -> Option<Vec<String>> {
        if !ancestor.contains(self) {
            return None;
        }
        Some(self.segments().split_off(ancestor.depth()))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("."))
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Path::Root);
        }
        let parts: Vec<&str> = s.split('.').collect();
        let section =
            Section::from_name(parts[0]).ok_or_else(|| PathError::UnknownSection(parts[0].into()))?;

        match (section, &parts[1..]) {
            (_, []) => Ok(Path::Section(section)),
            (Section::Shapes, [id]) => Ok(Path::Shape(id.parse()?)),
            (Section::Shapes, [id, key]) => Ok(Path::ShapeField(id.parse()?, FieldKey::new(*key)?)),
            (_, [name]) => Ok(Path::Field(Field::parse(section, name)?)),
            _ => Err(PathError::TooDeep(s.to_string())),
        }
    }
}

impl From<Section> for Path {
    fn from(section: Section) -> Self {
        Path::Section(section)
    }
}

impl From<Field> for Path {
    fn from(field: Field) -> Self {
        Path::Field(field)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ShapeId {
        "0b5e3c1a-9d0f-4b7e-8a54-2f1c6d9e0a11".parse().unwrap()
    }

    #[test]
    fn test_parse_each_shape_of_path() {
        assert_eq!("".parse::<Path>().unwrap(), Path::Root);
        assert_eq!("camera".parse::<Path>().unwrap(), Path::Section(Section::Camera));
        assert_eq!("style.strokeWidth".parse::<Path>().unwrap(), Path::Field(Field::StyleStrokeWidth));
        assert_eq!(
            "shapes.0b5e3c1a-9d0f-4b7e-8a54-2f1c6d9e0a11".parse::<Path>().unwrap(),
            Path::Shape(id())
        );
        assert_eq!(
            "shapes.0b5e3c1a-9d0f-4b7e-8a54-2f1c6d9e0a11.strokeWidth"
                .parse::<Path>()
                .unwrap(),
            Path::shape_field(id(), "strokeWidth").unwrap()
        );
    }

    #[test]
    fn test_display_matches_parse() {
        let paths = [
            Path::Root,
            Path::Section(Section::Selection),
            Path::Field(Field::CameraZoom),
            Path::Shape(id()),
            Path::shape_field(id(), "x").unwrap(),
        ];
        for p in paths {
            assert_eq!(p.to_string().parse::<Path>().unwrap(), p);
        }
        assert_eq!(Path::Field(Field::SelectionIds).to_string(), "selection.ids");
    }

    #[test]
    fn test_parse_rejects_invalid_paths() {
        assert_eq!(
            "layers".parse::<Path>().unwrap_err(),
            PathError::UnknownSection("layers".to_string())
        );
        assert!(matches!(
            "camera.pitch".parse::<Path>().unwrap_err(),
            PathError::UnknownField { section: Section::Camera, .. }
        ));
        assert!(matches!(
            "shapes.not-a-uuid".parse::<Path>().unwrap_err(),
            PathError::InvalidShapeId(_)
        ));
        assert!(matches!(
            "camera.zoom.extra".parse::<Path>().unwrap_err(),
            PathError::TooDeep(_)
        ));
        assert!(matches!(
            format!("shapes.{}.9lives", id()).parse::<Path>().unwrap_err(),
            PathError::InvalidFieldName(_)
        ));
    }

    #[test]
    fn test_field_key_validation() {
        assert!(FieldKey::new("strokeWidth").is_ok());
        assert!(FieldKey::new("scale_x2").is_ok());
        for bad in ["", "_x", "1x", "a.b", "a-b", "é"] {
            assert!(FieldKey::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_every_section_field_round_trips() {
        for section in Section::ALL {
            for field in section.fields() {
                assert_eq!(field.section(), section);
                let p = Path::Field(*field);
                assert_eq!(p.to_string().parse::<Path>().unwrap(), p);
            }
        }
    }

    #[test]
    fn test_ancestry() {
        let shape = Path::Shape(id());
        let x = Path::shape_field(id(), "x").unwrap();
        let shapes = Path::Section(Section::Shapes);

        assert!(Path::Root.is_ancestor_of(&x));
        assert!(shapes.is_ancestor_of(&shape));
        assert!(shape.is_ancestor_of(&x));
        assert!(!x.is_ancestor_of(&shape));
        assert!(!shape.is_ancestor_of(&shape));
        assert!(shape.contains(&shape));

        let camera = Path::Section(Section::Camera);
        assert!(!camera.overlaps(&x));
        assert!(x.overlaps(&shapes));
        assert!(Path::Root.overlaps(&camera));
    }

    #[test]
    fn test_sibling_shapes_do_not_overlap() {
        let a = Path::Shape(ShapeId::new());
        let b = Path::Shape(ShapeId::new());
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_relative_to() {
        let x = Path::shape_field(id(), "x").unwrap();
        assert_eq!(x.relative_to(&Path::Shape(id())).unwrap(), vec!["x".to_string()]);
        assert_eq!(
            x.relative_to(&Path::Section(Section::Shapes)).unwrap(),
            vec![id().to_string(), "x".to_string()]
        );
        assert!(x.relative_to(&x).unwrap().is_empty());
        assert!(x.relative_to(&Path::Section(Section::Camera)).is_none());
    }

    #[test]
    fn test_serde_as_dotted_string() {
        let json = serde_json::to_string(&Path::Field(Field::ToolCurrent)).unwrap();
        assert_eq!(json, "\"tool.current\"");
        let parsed: Path = serde_json::from_str("\"style.opacity\"").unwrap();
        assert_eq!(parsed, Path::Field(Field::StyleOpacity));
        assert!(serde_json::from_str::<Path>("\"style.bogus\"").is_err());
    }
}
