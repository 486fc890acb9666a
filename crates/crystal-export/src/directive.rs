//! Shape-placement directives and their Lumerical script form

use nalgebra::{Point2, Vector2};
use std::fmt;

/// Material assigned to every etched shape
pub const ETCH_MATERIAL: &str = "etch";

/// One shape command inside a structure group script
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Clears everything the group generated on a previous run
    DeleteAll,
    AddCircle {
        center: Point2<f64>,
        radius: f64,
        z: f64,
        z_span: f64,
        material: String,
    },
    /// Closed polygon; vertices are relative to `center`
    AddPolygon {
        center: Point2<f64>,
        vertices: Vec<Vector2<f64>>,
        z_span: f64,
        material: String,
    },
}

/// Script number literal; exponent form keeps metre-scale values readable
pub fn num(value: f64) -> String {
    format!("{:e}", value)
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::DeleteAll => writeln!(f, "deleteall;"),
            Directive::AddCircle {
                center,
                radius,
                z,
                z_span,
                material,
            } => {
                writeln!(f, "addcircle;")?;
                writeln!(f, "set(\"radius\", {});", num(*radius))?;
                writeln!(f, "set(\"x\", {});", num(center.x))?;
                writeln!(f, "set(\"y\", {});", num(center.y))?;
                writeln!(f, "set(\"z\", {});", num(*z))?;
                writeln!(f, "set(\"z span\", {});", num(*z_span))?;
                writeln!(f, "set(\"material\", \"{}\");", material)
            }
            Directive::AddPolygon {
                center,
                vertices,
                z_span,
                material,
            } => {
                let vertices = vertices
                    .iter()
                    .map(|v| format!("{},{}", num(v.x), num(v.y)))
                    .collect::<Vec<_>>()
                    .join(";");
                writeln!(f, "addpoly;")?;
                writeln!(f, "set(\"x\", {});", num(center.x))?;
                writeln!(f, "set(\"y\", {});", num(center.y))?;
                writeln!(f, "set(\"vertices\", [{}]);", vertices)?;
                writeln!(f, "set(\"z span\", {});", num(*z_span))?;
                writeln!(f, "set(\"material\", \"{}\");", material)
            }
        }
    }
}

/// Ordered directives for one crystal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveStream {
    directives: Vec<Directive>,
}

impl DirectiveStream {
    /// A stream that starts by clearing prior generated content
    pub fn new() -> Self {
        Self {
            directives: vec![Directive::DeleteAll],
        }
    }

    pub fn push(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn circles(&self) -> impl Iterator<Item = (&Point2<f64>, f64)> {
        self.directives.iter().filter_map(|d| match d {
            Directive::AddCircle { center, radius, .. } => Some((center, *radius)),
            _ => None,
        })
    }

    pub fn polygons(&self) -> impl Iterator<Item = (&Point2<f64>, &[Vector2<f64>])> {
        self.directives.iter().filter_map(|d| match d {
            Directive::AddPolygon { center, vertices, .. } => Some((center, vertices.as_slice())),
            _ => None,
        })
    }

    /// Newline-joined script, one blank line between shapes
    pub fn to_script(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DirectiveStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, directive) in self.directives.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", directive)?;
        }
        Ok(())
    }
}
