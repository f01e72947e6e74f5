use std::collections::{BTreeMap, HashSet};

use aquarium_config::Configuration;
use serde::Serialize;

use crate::error::PartsError;
use crate::feature::{Feature, FeatureKind, Measure};

/// Named collection of features, in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    name: String,
    features: Vec<Feature>,
}

impl Group {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }
}

/// Every generated feature, grouped. Feature names are unique across groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    groups: Vec<Group>,
    names: HashSet<String>,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `feature` to `group`, creating the group on first use.
    pub fn add(&mut self, group: &str, feature: Feature) -> Result<(), PartsError> {
        if !self.names.insert(feature.name().to_string()) {
            return Err(PartsError::DuplicateFeature {
                name: feature.name().to_string(),
            });
        }
        match self.groups.iter_mut().find(|existing| existing.name == group) {
            Some(existing) => existing.features.push(feature),
            None => self.groups.push(Group {
                name: group.to_string(),
                features: vec![feature],
            }),
        }
        Ok(())
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.groups.iter().flat_map(|group| group.features.iter())
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features().find(|feature| feature.name() == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Evaluates every binding against the current values of `config`.
    pub fn resolve(&self, config: &Configuration) -> Result<Vec<ResolvedGroup>, PartsError> {
        self.groups
            .iter()
            .map(|group| {
                let features = group
                    .features
                    .iter()
                    .map(|feature| resolve_feature(feature, config))
                    .collect::<Result<_, _>>()?;
                Ok(ResolvedGroup {
                    name: group.name.clone(),
                    features,
                })
            })
            .collect()
    }
}

fn resolve_feature(feature: &Feature, config: &Configuration) -> Result<ResolvedFeature, PartsError> {
    let mut values = BTreeMap::new();
    for binding in feature.bindings() {
        let value = config
            .workbook()
            .evaluate(binding.formula())
            .map_err(|source| PartsError::Resolve {
                feature: feature.name().to_string(),
                property: binding.property().to_string(),
                source,
            })?;
        let value = match binding.measure() {
            Measure::Count => {
                let count = value.trunc();
                if count < 0.0 {
                    return Err(PartsError::NegativeCount {
                        feature: feature.name().to_string(),
                        property: binding.property().to_string(),
                        value,
                    });
                }
                count
            }
            Measure::Length if value < 0.0 => {
                return Err(PartsError::NegativeDimension {
                    feature: feature.name().to_string(),
                    property: binding.property().to_string(),
                    value,
                });
            }
            Measure::Length | Measure::Position | Measure::Angle => value,
        };
        values.insert(binding.property().to_string(), value);
    }
    Ok(ResolvedFeature {
        name: feature.name().to_string(),
        kind: feature.kind(),
        source: feature.source().map(str::to_string),
        values,
    })
}

/// A feature with its bindings replaced by their current values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFeature {
    pub name: String,
    pub kind: FeatureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub values: BTreeMap<String, f64>,
}

impl ResolvedFeature {
    pub fn value(&self, property: &str) -> Option<f64> {
        self.values.get(property).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedGroup {
    pub name: String,
    pub features: Vec<ResolvedFeature>,
}

#[cfg(test)]
mod tests {
    use aquarium_config::{Configuration, SchemaKind};

    use super::Assembly;
    use crate::error::PartsError;
    use crate::feature::{Axis, FeatureKind, Measure, Feature, ortho_array, panel};

    fn config() -> Configuration {
        Configuration::new().expect("configuration")
    }

    #[test]
    fn duplicate_names_are_rejected_across_groups() {
        let mut assembly = Assembly::new();
        assembly
            .add("A", Feature::new("Beam", FeatureKind::Beam))
            .expect("add");
        let err = assembly
            .add("B", Feature::new("Beam", FeatureKind::Beam))
            .expect_err("duplicate");
        assert_eq!(err, PartsError::DuplicateFeature { name: "Beam".into() });
        assert_eq!(assembly.len(), 1);
        assert!(assembly.group("B").is_none());
    }

    #[test]
    fn resolve_snapshots_current_values() {
        let mut assembly = Assembly::new();
        assembly
            .add(
                "LevelingBase",
                panel(
                    "BottomBase",
                    ["Computed.LeftCornerX", "-Computed.Length/2", "Computed.UnderGlassBaseLevel"],
                    ["Computed.Width", "Computed.Length", "Config.UnderGlassLevelingBaseThickness"],
                )
                .expect("panel"),
            )
            .expect("add");
        let mut config = config();
        let resolved = assembly.resolve(&config).expect("resolve");
        let base = &resolved[0].features[0];
        assert_eq!(base.value("x"), Some(-585.0));
        assert_eq!(base.value("length"), Some(1170.0));

        config
            .apply_edits(&[aquarium_config::Edit::new(SchemaKind::Config, "Width", 800.0)])
            .expect("edit");
        let resolved = assembly.resolve(&config).expect("resolve");
        assert_eq!(resolved[0].features[0].value("length"), Some(770.0));
    }

    #[test]
    fn counts_are_truncated() {
        let mut assembly = Assembly::new();
        assembly
            .add(
                "ClosedLoop",
                ortho_array("Nozzles", "Nozzle")
                    .repeat(Axis::X, "Computed.NozzlesSpacingX", "Computed.NozzlesNumberX")
                    .expect("repeat"),
            )
            .expect("add");
        let resolved = assembly.resolve(&config()).expect("resolve");
        assert_eq!(resolved[0].features[0].value("number_x"), Some(6.0));
    }

    #[test]
    fn negative_values_name_the_feature_and_property() {
        let mut assembly = Assembly::new();
        assembly
            .add(
                "Test",
                Feature::new("Array", FeatureKind::OrthoArray)
                    .bind("number_x", Measure::Count, "-Computed.BeamsDir-1")
                    .expect("bind"),
            )
            .expect("add");
        let err = assembly.resolve(&config()).expect_err("negative count");
        assert!(matches!(
            &err,
            PartsError::NegativeCount { feature, property, .. } if feature == "Array" && property == "number_x"
        ));

        let mut assembly = Assembly::new();
        assembly
            .add(
                "Test",
                Feature::new("Slab", FeatureKind::Panel)
                    .bind("height", Measure::Length, "Computed.LeftCornerX")
                    .expect("bind"),
            )
            .expect("add");
        let err = assembly.resolve(&config()).expect_err("negative dimension");
        assert_eq!(
            err.to_string(),
            "Slab.height resolved to a negative dimension (-585)"
        );
    }

    #[test]
    fn unknown_reference_is_a_resolve_error() {
        let mut assembly = Assembly::new();
        assembly
            .add(
                "Test",
                Feature::new("Ghost", FeatureKind::Box)
                    .bind("x", Measure::Position, "Computed.Nope")
                    .expect("bind"),
            )
            .expect("add");
        let err = assembly.resolve(&config()).expect_err("unknown");
        assert!(err.to_string().starts_with("cannot resolve Ghost.x"));
    }
}
