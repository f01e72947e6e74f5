use std::fmt;
use std::sync::Arc;

use aquarium_formula::Formula;
use serde::Serialize;

use crate::error::PartsError;

/// Geometric primitive a feature stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Box,
    Cylinder,
    Beam,
    Column,
    Pipe,
    Panel,
    Sketch,
    OrthoArray,
    LinearPattern,
    Hole,
}

impl FeatureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Box => "box",
            FeatureKind::Cylinder => "cylinder",
            FeatureKind::Beam => "beam",
            FeatureKind::Column => "column",
            FeatureKind::Pipe => "pipe",
            FeatureKind::Panel => "panel",
            FeatureKind::Sketch => "sketch",
            FeatureKind::OrthoArray => "ortho_array",
            FeatureKind::LinearPattern => "linear_pattern",
            FeatureKind::Hole => "hole",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a resolved property value is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Signed coordinate or offset.
    Position,
    /// Size; must not be negative.
    Length,
    /// Repetition count; truncated to an integer, must not be negative.
    Count,
    /// Rotation in degrees.
    Angle,
}

/// A property bound to a live formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    property: String,
    measure: Measure,
    formula: Arc<Formula>,
}

impl Binding {
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }
}

/// Axis of an ortho array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn suffix(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// Cross-section of the profiles used for beams and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    pub width: &'static str,
    pub height: &'static str,
}

impl Profile {
    pub const METAL: Profile = Profile {
        width: "Config.MetalProfileWidth",
        height: "Config.MetalProfileHeight",
    };

    pub const CANOPY: Profile = Profile {
        width: "Config.CanopyProfileWidth",
        height: "Config.CanopyProfileHeight",
    };
}

/// A named primitive whose properties are bound to formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    name: String,
    kind: FeatureKind,
    source: Option<String>,
    bindings: Vec<Binding>,
}

impl Feature {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            source: None,
            bindings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Feature replicated by an array or pattern.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn binding(&self, property: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|binding| binding.property == property)
    }

    pub fn of(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// Binds `property` to `formula`, replacing an earlier binding of the same property.
    pub fn bind(mut self, property: &str, measure: Measure, formula: &str) -> Result<Self, PartsError> {
        let parsed = Formula::parse(formula).map_err(|source| PartsError::Binding {
            feature: self.name.clone(),
            property: property.to_string(),
            source,
        })?;
        let binding = Binding {
            property: property.to_string(),
            measure,
            formula: Arc::new(parsed),
        };
        match self
            .bindings
            .iter_mut()
            .find(|existing| existing.property == property)
        {
            Some(existing) => *existing = binding,
            None => self.bindings.push(binding),
        }
        Ok(self)
    }

    pub fn at(self, x: &str, y: &str, z: &str) -> Result<Self, PartsError> {
        self.bind("x", Measure::Position, x)?
            .bind("y", Measure::Position, y)?
            .bind("z", Measure::Position, z)
    }

    pub fn size(self, length: &str, width: &str, height: &str) -> Result<Self, PartsError> {
        self.bind("length", Measure::Length, length)?
            .bind("width", Measure::Length, width)?
            .bind("height", Measure::Length, height)
    }

    pub fn yaw(self, degrees: &str) -> Result<Self, PartsError> {
        self.bind("yaw", Measure::Angle, degrees)
    }

    /// Repeats the source `number` times along `axis`, `interval` apart.
    pub fn repeat(self, axis: Axis, interval: &str, number: &str) -> Result<Self, PartsError> {
        let suffix = axis.suffix();
        self.bind(&format!("interval_{suffix}"), Measure::Length, interval)?
            .bind(&format!("number_{suffix}"), Measure::Count, number)
    }

    pub fn dimension(self, name: &str, formula: &str) -> Result<Self, PartsError> {
        self.bind(name, Measure::Length, formula)
    }
}

/// Box with its corner at `(x, y, z)`.
pub fn panel(
    name: &str,
    [x, y, z]: [&str; 3],
    [length, width, height]: [&str; 3],
) -> Result<Feature, PartsError> {
    Feature::new(name, FeatureKind::Panel)
        .at(x, y, z)?
        .size(length, width, height)
}

pub fn cuboid(
    name: &str,
    [x, y, z]: [&str; 3],
    [length, width, height]: [&str; 3],
) -> Result<Feature, PartsError> {
    Feature::new(name, FeatureKind::Box)
        .at(x, y, z)?
        .size(length, width, height)
}

pub fn cylinder(
    name: &str,
    [x, y, z]: [&str; 3],
    radius: &str,
    height: &str,
) -> Result<Feature, PartsError> {
    Feature::new(name, FeatureKind::Cylinder)
        .at(x, y, z)?
        .bind("radius", Measure::Length, radius)?
        .bind("height", Measure::Length, height)
}

pub fn hole(
    name: &str,
    [x, y, z]: [&str; 3],
    radius: &str,
    height: &str,
) -> Result<Feature, PartsError> {
    Feature::new(name, FeatureKind::Hole)
        .at(x, y, z)?
        .bind("radius", Measure::Length, radius)?
        .bind("height", Measure::Length, height)
}

/// Horizontal profile of `length`, rotated by `yaw` degrees around Z.
pub fn beam(
    name: &str,
    profile: Profile,
    [x, y, z]: [&str; 3],
    length: &str,
    yaw: &str,
) -> Result<Feature, PartsError> {
    Feature::new(name, FeatureKind::Beam)
        .at(x, y, z)?
        .bind("profile_width", Measure::Length, profile.width)?
        .bind("profile_height", Measure::Length, profile.height)?
        .bind("length", Measure::Length, length)?
        .yaw(yaw)
}

pub fn column(
    name: &str,
    profile: Profile,
    [x, y, z]: [&str; 3],
    height: &str,
) -> Result<Feature, PartsError> {
    Feature::new(name, FeatureKind::Column)
        .at(x, y, z)?
        .bind("profile_width", Measure::Length, profile.width)?
        .bind("profile_height", Measure::Length, profile.height)?
        .bind("height", Measure::Length, height)
}

pub fn pipe(
    name: &str,
    [x, y, z]: [&str; 3],
    length: &str,
    diameter: &str,
) -> Result<Feature, PartsError> {
    Feature::new(name, FeatureKind::Pipe)
        .at(x, y, z)?
        .bind("length", Measure::Length, length)?
        .bind("diameter", Measure::Length, diameter)
}

pub fn ortho_array(name: &str, source: &str) -> Feature {
    Feature::new(name, FeatureKind::OrthoArray).of(source)
}

/// `occurrences` copies of `source` spread over `length`.
pub fn linear_pattern(
    name: &str,
    source: &str,
    length: &str,
    occurrences: &str,
) -> Result<Feature, PartsError> {
    Feature::new(name, FeatureKind::LinearPattern)
        .of(source)
        .bind("length", Measure::Length, length)?
        .bind("occurrences", Measure::Count, occurrences)
}

pub fn sketch(name: &str) -> Feature {
    Feature::new(name, FeatureKind::Sketch)
}

#[cfg(test)]
mod tests {
    use super::{Axis, Feature, FeatureKind, Measure, ortho_array, panel};
    use crate::error::PartsError;

    #[test]
    fn bindings_keep_the_formula_source() {
        let feature = panel(
            "BottomBase",
            ["Computed.LeftCornerX", "-Computed.Length/2", "Computed.UnderGlassBaseLevel"],
            ["Computed.Width", "Computed.Length", "Config.UnderGlassLevelingBaseThickness"],
        )
        .expect("panel");
        assert_eq!(feature.kind(), FeatureKind::Panel);
        assert_eq!(feature.bindings().len(), 6);
        let y = feature.binding("y").expect("y");
        assert_eq!(y.measure(), Measure::Position);
        assert_eq!(y.formula().source(), "-Computed.Length/2");
    }

    #[test]
    fn rebinding_replaces_the_property() {
        let feature = Feature::new("Cut", FeatureKind::Box)
            .yaw("45")
            .expect("yaw")
            .yaw("-45")
            .expect("yaw");
        assert_eq!(feature.bindings().len(), 1);
        assert_eq!(
            feature.binding("yaw").map(|b| b.formula().source()),
            Some("-45")
        );
    }

    #[test]
    fn array_axes_bind_interval_and_count() {
        let array = ortho_array("Columns", "CornerColumn")
            .repeat(Axis::X, "Computed.StandBeamSpacing", "Config.BeamsStandCount")
            .expect("repeat");
        assert_eq!(array.source(), Some("CornerColumn"));
        assert_eq!(
            array.binding("number_x").map(|b| b.measure()),
            Some(Measure::Count)
        );
        assert_eq!(
            array.binding("interval_x").map(|b| b.measure()),
            Some(Measure::Length)
        );
    }

    #[test]
    fn malformed_binding_names_the_property() {
        let err = Feature::new("Broken", FeatureKind::Pipe)
            .bind("length", Measure::Length, "Computed.Width+")
            .expect_err("should fail");
        assert!(matches!(
            &err,
            PartsError::Binding { feature, property, .. } if feature == "Broken" && property == "length"
        ));
        assert!(err.to_string().starts_with("invalid binding for Broken.length"));
    }
}
