//! Engine session boundary
//!
//! The assembler only ever deletes and adds named objects. `ScriptSession`
//! records those calls so they can be rendered into a Lumerical script.

use crate::directive::num;
use crate::error::Result;

/// Engine object types the assembler creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    StructureGroup,
    ModeSource,
    PowerMonitor,
    Rect,
    FdtdRegion,
    ProfileMonitor,
    IndexMonitor,
    Movie,
}

impl ObjectKind {
    /// Script command that creates this kind of object
    pub fn command(&self) -> &'static str {
        match self {
            ObjectKind::StructureGroup => "addstructuregroup",
            ObjectKind::ModeSource => "addmode",
            ObjectKind::PowerMonitor => "addpower",
            ObjectKind::Rect => "addrect",
            ObjectKind::FdtdRegion => "addfdtd",
            ObjectKind::ProfileMonitor => "addprofile",
            ObjectKind::IndexMonitor => "addindex",
            ObjectKind::Movie => "addmovie",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Int(i64),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    /// Script literal for this value
    pub fn to_script(&self) -> String {
        match self {
            PropertyValue::Number(v) => num(*v),
            PropertyValue::Int(v) => v.to_string(),
            PropertyValue::Bool(v) => v.to_string(),
            // Single quotes so embedded scripts keep their double-quoted strings
            PropertyValue::Text(s) if s.contains('"') => format!("'{}'", s),
            PropertyValue::Text(s) => format!("\"{}\"", s),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        PropertyValue::Int(v.into())
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

/// A named engine object with its properties in the order they are set
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub properties: Vec<(String, PropertyValue)>,
}

impl SceneObject {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((key.to_string(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Shorthand for numeric properties such as `"x"` or `"y span"`
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropertyValue::as_number)
    }
}

/// Handle to a simulation engine session
pub trait EngineSession {
    /// Remove the object called `name`; removing a missing object is not an error
    fn delete(&mut self, name: &str) -> Result<()>;

    fn add(&mut self, object: SceneObject) -> Result<()>;

    /// Replace any same-named object
    fn upsert(&mut self, object: SceneObject) -> Result<()> {
        self.delete(&object.name)?;
        self.add(object)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Delete(String),
    Add(SceneObject),
}

/// Session that records every call and tracks the objects that would exist
#[derive(Debug, Clone, Default)]
pub struct ScriptSession {
    commands: Vec<SessionCommand>,
    objects: Vec<SceneObject>,
}

impl ScriptSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls in the order they were issued
    pub fn commands(&self) -> &[SessionCommand] {
        &self.commands
    }

    /// Objects currently alive, in creation order
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }
}

impl EngineSession for ScriptSession {
    fn delete(&mut self, name: &str) -> Result<()> {
        self.objects.retain(|o| o.name != name);
        self.commands.push(SessionCommand::Delete(name.to_string()));
        Ok(())
    }

    fn add(&mut self, object: SceneObject) -> Result<()> {
        self.objects.push(object.clone());
        self.commands.push(SessionCommand::Add(object));
        Ok(())
    }
}
