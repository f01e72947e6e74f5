//! Parametric part plans for the aquarium generator.
//!
//! Every generator appends [`Feature`]s to an [`Assembly`]. A feature only
//! holds formulas over `Config*` and `Computed` values, so the plan stays
//! valid across edits; [`Assembly::resolve`] turns it into numbers for the
//! current configuration.

mod assembly;
mod base;
mod canopy;
mod error;
mod fastener;
mod feature;
mod glass;
mod panels;
mod plumbing;
mod stand;
mod weir;

use std::fmt;

use aquarium_config::Configuration;
use serde::Serialize;
use tracing::{debug, info};

pub use assembly::{Assembly, Group, ResolvedFeature, ResolvedGroup};
pub use error::PartsError;
pub use fastener::{Support, supports};
pub use feature::{
    Axis, Binding, Feature, FeatureKind, Measure, Profile, beam, column, cuboid, cylinder, hole,
    linear_pattern, ortho_array, panel, pipe, sketch,
};
pub use plumbing::{FlangeCounter, FlangeParts, flange};

/// Generation steps, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Section {
    StandStructure,
    StandPanels,
    LevelingBase,
    Glasses,
    Weir,
    Flanges,
    Pipes,
    ClosedLoop,
    CanopyStructure,
    CanopyPanels,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::StandStructure,
        Section::StandPanels,
        Section::LevelingBase,
        Section::Glasses,
        Section::Weir,
        Section::Flanges,
        Section::Pipes,
        Section::ClosedLoop,
        Section::CanopyStructure,
        Section::CanopyPanels,
    ];

    /// Group the section's main features land in.
    pub fn name(self) -> &'static str {
        match self {
            Section::StandStructure => stand::GROUP,
            Section::StandPanels => panels::STAND,
            Section::LevelingBase => base::GROUP,
            Section::Glasses => glass::GROUP,
            Section::Weir => weir::GROUP,
            Section::Flanges => plumbing::FLANGES,
            Section::Pipes => plumbing::PIPES,
            Section::ClosedLoop => plumbing::CLOSED_LOOP,
            Section::CanopyStructure => canopy::GROUP,
            Section::CanopyPanels => panels::CANOPY,
        }
    }

    fn build(
        self,
        config: &Configuration,
        assembly: &mut Assembly,
        counter: &mut FlangeCounter,
    ) -> Result<(), PartsError> {
        match self {
            Section::StandStructure => stand::generate(config, assembly),
            Section::StandPanels => panels::stand(assembly),
            Section::LevelingBase => base::generate(assembly),
            Section::Glasses => glass::generate(config, assembly),
            Section::Weir => weir::generate(assembly),
            Section::Flanges => plumbing::flanges(assembly, counter),
            Section::Pipes => plumbing::pipes(assembly),
            Section::ClosedLoop => plumbing::nozzles(assembly),
            Section::CanopyStructure => canopy::generate(assembly),
            Section::CanopyPanels => panels::canopy(assembly),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs every section in order.
pub fn generate(config: &mut Configuration) -> Result<Assembly, PartsError> {
    generate_sections(config, &Section::ALL)
}

/// Runs the given sections in order, then records how many weir flanges
/// were placed so the flange spacing follows.
pub fn generate_sections(
    config: &mut Configuration,
    sections: &[Section],
) -> Result<Assembly, PartsError> {
    let mut assembly = Assembly::new();
    let mut counter = FlangeCounter::new();
    for &section in sections {
        let before = assembly.len();
        section.build(config, &mut assembly, &mut counter)?;
        debug!(%section, features = assembly.len() - before, "generated section");
    }
    if sections.contains(&Section::Flanges) {
        config.set_flange_count(counter.count())?;
    }
    info!(
        features = assembly.len(),
        flanges = counter.count(),
        "generated assembly"
    );
    Ok(assembly)
}

#[cfg(test)]
mod tests {
    use aquarium_config::{Configuration, Edit, SchemaKind};

    use super::{Section, generate, generate_sections};

    fn config() -> Configuration {
        Configuration::new().expect("configuration")
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn sections_run_in_order() {
        let mut config = config();
        let assembly = generate(&mut config).expect("generate");
        let groups: Vec<&str> = assembly.groups().iter().map(|group| group.name()).collect();
        assert_eq!(
            groups,
            [
                "StandStructure",
                "PanelSupports",
                "StandPanels",
                "LevelingBase",
                "Glasses",
                "Weir",
                "Flanges",
                "Pipes",
                "ClosedLoop",
                "CanopyStructure",
                "CanopyPanels",
            ]
        );
    }

    #[test]
    fn every_binding_resolves_at_defaults() {
        let mut config = config();
        let assembly = generate(&mut config).expect("generate");
        let resolved = assembly.resolve(&config).expect("resolve");
        let features: usize = resolved.iter().map(|group| group.features.len()).sum();
        assert_eq!(features, assembly.len());
    }

    #[test]
    fn flange_count_drives_the_weir_spacing() {
        let mut config = config();
        let assembly = generate(&mut config).expect("generate");
        assert_close(config.computed("FlangeCount").expect("count"), 6.0);

        let resolved = assembly.resolve(&config).expect("resolve");
        let flanges = resolved
            .iter()
            .find(|group| group.name == "Flanges")
            .expect("flange group");
        let x = |name: &str| {
            flanges
                .features
                .iter()
                .find(|feature| feature.name == name)
                .and_then(|feature| feature.value("x"))
                .expect("flange x")
        };
        let offset = config.computed("WeirFlangeOffset").expect("offset");
        assert_close(x("FlangeDrainHead_1") - x("FlangeReturnHead_0"), offset);
        assert_close(x("FlangeReturnHead_5"), config.computed("StartPipes").expect("start") + 5.0 * offset);
    }

    #[test]
    fn partial_generation_leaves_the_flange_count_alone() {
        let mut config = config();
        let assembly =
            generate_sections(&mut config, &[Section::StandStructure, Section::Glasses]).expect("generate");
        assert!(assembly.group("Flanges").is_none());
        assert_close(config.computed("FlangeCount").expect("count"), 0.0);
    }

    #[test]
    fn cross_beams_follow_the_short_side() {
        let mut config = config();
        let assembly = generate(&mut config).expect("generate");
        let resolved = assembly.resolve(&config).expect("resolve");
        let array = resolved
            .iter()
            .flat_map(|group| &group.features)
            .find(|feature| feature.name == "BaseReinforcements")
            .expect("array");
        assert_eq!(array.value("number_x"), Some(5.0));
        assert_eq!(array.value("number_y"), Some(1.0));

        config
            .apply_edits(&[
                Edit::new(SchemaKind::Config, "Width", 500.0),
                Edit::new(SchemaKind::Config, "Length", 1000.0),
            ])
            .expect("edit");
        let resolved = assembly.resolve(&config).expect("resolve long tank");
        let array = resolved
            .iter()
            .flat_map(|group| &group.features)
            .find(|feature| feature.name == "BaseReinforcements")
            .expect("array");
        assert_eq!(array.value("number_x"), Some(1.0));
        assert_eq!(array.value("number_y"), Some(5.0));
        assert_close(
            array.value("interval_y").expect("interval"),
            config.computed("StandBeamSpacing").expect("spacing"),
        );
    }

    #[test]
    fn miter_toggles_change_the_plan() {
        let mut config = config();
        let mitered = generate(&mut config).expect("generate");
        assert!(mitered.feature("FrontBeamMiter").is_some());
        assert!(mitered.feature("cut45LeftGlass").is_none());

        config
            .apply_edits(&[
                Edit::new(SchemaKind::Config, "StandCut45", false),
                Edit::new(SchemaKind::Config, "GlassCut45", true),
            ])
            .expect("edit");
        let butted = generate(&mut config).expect("regenerate");
        assert!(butted.feature("FrontBeamMiter").is_none());
        assert!(butted.feature("cut45LeftGlass").is_some());
        butted.resolve(&config).expect("resolve");
    }

    #[test]
    fn resolved_parts_serialize() {
        let mut config = config();
        let assembly = generate_sections(&mut config, &[Section::CanopyStructure]).expect("generate");
        let resolved = assembly.resolve(&config).expect("resolve");
        let json = serde_json::to_value(&resolved).expect("json");
        assert_eq!(json[0]["name"], "CanopyStructure");
        assert_eq!(json[0]["features"][0]["kind"], "beam");
        assert!(json[0]["features"][0].get("source").is_none());
    }
}
