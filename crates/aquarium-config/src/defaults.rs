//! The four standard schemas.

use std::sync::{Arc, OnceLock};

use crate::error::SchemaError;
use crate::schema::{Categories, Category, Schema, SchemaBuilder, SchemaKind, SchemaSet};

use Category::{Canopy, Glass, Plumbing, Structure, Visual, Weir};

const MM: Option<&str> = Some("mm");

static STANDARD: OnceLock<Result<Arc<SchemaSet>, SchemaError>> = OnceLock::new();

/// The process-wide standard schema set, built on first use.
pub fn standard_schemas() -> Result<Arc<SchemaSet>, SchemaError> {
    STANDARD.get_or_init(|| build_standard().map(Arc::new)).clone()
}

pub fn build_standard() -> Result<SchemaSet, SchemaError> {
    let mut categories = Categories::default();
    let config = config_schema(&mut categories)?;
    let drain = pipe_schema(SchemaKind::PipesDrain, 200.0, &mut categories)?;
    let ret = pipe_schema(SchemaKind::PipesReturn, 100.0, &mut categories)?;
    let nozzle = pipe_schema(SchemaKind::PipesNozzleClosedLoop, 100.0, &mut categories)?;
    Ok(SchemaSet::new(vec![config, drain, ret, nozzle], categories))
}

fn config_schema(categories: &mut Categories) -> Result<Schema, SchemaError> {
    let mut s = SchemaBuilder::new(SchemaKind::Config, categories);

    s.add_num("Width", 1200.0, 20.0, 5000.0, 10.0, "External width of aquarium", MM, &[Structure, Visual])?;
    s.add_num("Length", 580.0, 20.0, 5000.0, 10.0, "External length of aquarium", MM, &[Structure, Visual])?;
    s.add_num("VisibleHeightGlass", 600.0, 20.0, 2000.0, 10.0, "Visible height of the glass", MM, &[Structure, Visual])?;
    s.add_num("StandVisibleHeight", 800.0, 500.0, 1500.0, 10.0, "Visible height of the stand", MM, &[Structure, Visual])?;
    s.add_num("Sump2FloorSpaceForBroom", 100.0, 0.0, 500.0, 10.0, "Space between sump and floor", MM, &[Structure])?;
    s.add_num("Panel2FloorSpace", 5.0, 0.0, 100.0, 1.0, "Space between panels and floor", MM, &[Visual, Structure])?;
    s.add_num("BeamsStandCount", 5.0, 0.0, 10.0, 1.0, "Number of beams under the tank", None, &[Structure, Plumbing])?;
    s.add_num("BeamsSumpCount", 5.0, 0.0, 10.0, 1.0, "Number of beams under the sump", None, &[Structure])?;
    s.add_num("ColumnsStandWidthCount", 1.0, 0.0, 10.0, 1.0, "Intermediate stand columns along the width", None, &[Structure])?;
    s.add_bool("StandCut45", true, "Miter stand profile joints at 45 degrees", &[Structure])?;

    s.add_num("PanelMountHoleSpacing", 30.0, 10.0, 50.0, 1.0, "Spacing between panel mount holes", MM, &[Structure])?;
    s.add_num("PanelMountHoleBorderSpacing", 10.0, 10.0, 50.0, 1.0, "Spacing between panel mount holes and the border", MM, &[Structure])?;
    s.add_num("PanelMountHoleDiameter", 5.0, 2.0, 10.0, 1.0, "Diameter of panel mount holes", MM, &[Structure])?;
    s.add_num("PanelMountHoleCountVertical", 2.0, 1.0, 6.0, 1.0, "Vertical count of panel mount holes", None, &[Structure])?;
    s.add_num("PanelMountHoleCountHorizontal", 2.0, 1.0, 6.0, 1.0, "Horizontal count of panel mount holes", None, &[Structure])?;
    s.add_num("PanelMountThickness", 3.0, 1.0, 6.0, 1.0, "Thickness of panel mount plates", MM, &[Structure])?;
    s.add_num("PanelBlockThickness", 5.0, 5.0, 30.0, 1.0, "Thickness of panel blocks", MM, &[Structure])?;
    s.add_num("PanelMountInset", 10.0, 0.0, 30.0, 1.0, "Inset of panel mounts", MM, &[Structure])?;
    s.add_num("PanelThickness", 15.0, 1.0, 30.0, 1.0, "Panel thickness", MM, &[Structure])?;

    s.add_num("SidesGlassThickness", 12.0, 2.0, 30.0, 1.0, "Thickness of the side glass panels", MM, &[Structure, Glass])?;
    s.add_num("BottomGlassThickness", 19.0, 2.0, 30.0, 1.0, "Thickness of the bottom glass panel", MM, &[Structure, Glass])?;
    s.add_num("BraceWidth", 50.0, 30.0, 100.0, 1.0, "Width of the euro braces", MM, &[Structure, Glass])?;
    s.add_bool("GlassCut45", false, "Miter glass panel edges at 45 degrees", &[Glass])?;
    s.add_num("UnderGlassLevelingBaseThickness", 25.0, 1.0, 50.0, 1.0, "Thickness of the leveling base under the glass", MM, &[Structure, Plumbing])?;
    s.add_num("HideExtraTop", 30.0, 0.0, 50.0, 1.0, "Glass hidden by the canopy at the top", MM, &[Visual])?;
    s.add_num("HideExtraBottom", 10.0, 0.0, 20.0, 1.0, "Glass hidden by the stand at the bottom", MM, &[Visual])?;

    s.add_num("WeirWallThickness", 4.0, 1.0, 10.0, 1.0, "Thickness of the weir walls", MM, &[Weir])?;
    s.add_num("WeirSlotWidth", 3.0, 1.0, 10.0, 1.0, "Width of the weir slots", MM, &[Weir])?;
    s.add_num("WaterHeightWeir", 600.0, 20.0, 2000.0, 10.0, "Water height in the weir", MM, &[Weir])?;
    s.add_num("WeirFastenerDiameter", 5.0, 2.0, 10.0, 1.0, "Diameter of weir fastener holes", MM, &[Weir])?;
    s.add_num("WeirFastenerOffset", 15.0, 5.0, 50.0, 1.0, "Offset of weir fasteners from the glass", MM, &[Weir])?;
    s.add_num("WeirFastenerHorizontalCount", 2.0, 2.0, 10.0, 1.0, "Number of fasteners along the weir top", None, &[Weir])?;
    s.add_num("BulkHeadDiameter", 33.0, 4.0, 300.0, 1.0, "Diameter of the bulkheads", MM, &[Plumbing])?;
    s.add_num("BulkHeadNumber", 6.0, 2.0, 10.0, 1.0, "Number of bulkheads in the weir", None, &[Weir, Plumbing])?;
    s.add_num("BeanAnimalMainDrainLevel", 450.0, 20.0, 2000.0, 10.0, "Level of the main drain pipe", MM, &[Weir, Plumbing])?;
    s.add_num("BeanAnimalAuxiliaryDrainLevel", 580.0, 20.0, 2000.0, 10.0, "Level of the auxiliary drain pipe", MM, &[Weir, Plumbing])?;
    s.add_num("BeanAnimalEmergencyDrainLevel", 600.0, 20.0, 2000.0, 10.0, "Level of the emergency drain pipe", MM, &[Weir, Plumbing])?;
    s.add_num("ReturnWaterLevel", 390.0, 20.0, 2000.0, 10.0, "Level of the return pipes", MM, &[Weir, Plumbing])?;

    s.add_num("NozzlesEveryXBeamSpace", 1.0, 1.0, 10.0, 1.0, "Place a nozzle every N beam spaces", None, &[Plumbing])?;
    s.add_num("NozzlesSkipBefore", 0.0, 0.0, 10.0, 1.0, "Beam spaces skipped before the first nozzle", None, &[Plumbing])?;
    s.add_num("NozzlesSkipAfter", 0.0, 0.0, 10.0, 1.0, "Beam spaces skipped after the last nozzle", None, &[Plumbing])?;
    s.add_num("NozzlesRows", 1.0, 0.0, 6.0, 1.0, "Rows of closed loop nozzles", None, &[Plumbing])?;

    s.add_num("MetalProfileWidth", 60.0, 20.0, 200.0, 1.0, "Width of the metal profile", MM, &[Structure])?;
    s.add_num("MetalProfileHeight", 30.0, 20.0, 200.0, 1.0, "Height of the metal profile", MM, &[Structure])?;
    s.add_num("MetalProfileWallThickness", 3.0, 1.0, 20.0, 1.0, "Wall thickness of the metal profile", MM, &[Structure])?;

    s.add_num("CanopyHeight", 200.0, 100.0, 600.0, 1.0, "Height of the canopy", MM, &[Canopy])?;
    s.add_num("CanopyProfileWidth", 20.0, 5.0, 100.0, 1.0, "Width of the canopy profile", MM, &[Canopy])?;
    s.add_num("CanopyProfileHeight", 20.0, 5.0, 100.0, 1.0, "Height of the canopy profile", MM, &[Canopy])?;
    s.add_num("CanopyBeams2Top", 100.0, 0.0, 100.0, 1.0, "Distance from the canopy beams to the top", MM, &[Canopy])?;
    s.add_num("CanopyExtraBeams", 2.0, 0.0, 10.0, 1.0, "Extra canopy beams between the sides", None, &[Canopy])?;

    Ok(s.finish())
}

/// Schema shared by the drain, return and closed loop pipe families.
fn pipe_schema(
    kind: SchemaKind,
    flange_max: f64,
    categories: &mut Categories,
) -> Result<Schema, SchemaError> {
    let mut s = SchemaBuilder::new(kind, categories);

    s.add_num("PipeDiameter", 33.0, 5.0, 100.0, 1.0, "Outer diameter of the pipe", MM, &[Plumbing])?;
    s.add_num("PipeThickness", 3.2, 0.1, 5.0, 0.1, "Wall thickness of the pipe", MM, &[Plumbing])?;
    s.add_num("FlangeDiameter", 45.0, 5.0, flange_max, 1.0, "Diameter of the flange", MM, &[Plumbing])?;
    s.add_num("FlangeFreeHeightTop", 21.0, 0.0, 200.0, 1.0, "Free height above the glass", MM, &[Plumbing])?;
    s.add_num("FlangeFreeDiameterTop", 90.0, 5.0, 200.0, 1.0, "Free diameter above the glass", MM, &[Plumbing])?;
    s.add_num("FlangeFreeHeightBottom", 21.0, 0.0, 200.0, 1.0, "Free height below the glass", MM, &[Plumbing])?;
    s.add_num("FlangeFreeDiameterBottom", 80.0, 5.0, 200.0, 1.0, "Free diameter below the glass", MM, &[Plumbing])?;
    s.add_num("FlangePipeLengthInside", 22.0, 0.0, 100.0, 1.0, "Pipe length inside the flange", MM, &[Plumbing])?;

    Ok(s.finish())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{build_standard, standard_schemas};
    use crate::schema::{Category, ConfigValue, SchemaKind};

    #[test]
    fn standard_set_has_four_schemas_in_order() {
        let set = build_standard().expect("standard schemas should be valid");
        let kinds: Vec<SchemaKind> = set.iter().map(|schema| schema.kind()).collect();
        assert_eq!(kinds, SchemaKind::ALL.to_vec());
        assert_eq!(set.get(SchemaKind::PipesDrain).map(|s| s.len()), Some(8));
        assert!(set.get(SchemaKind::Config).map(|s| s.len()).unwrap_or(0) >= 45);
    }

    #[test]
    fn pipe_families_differ_only_in_flange_bound() {
        let set = build_standard().expect("standard schemas should be valid");
        let flange_max = |kind| match set.value(kind, "FlangeDiameter") {
            Some(ConfigValue::Numeric(value)) => value.max,
            other => panic!("unexpected value: {other:?}"),
        };
        assert_eq!(flange_max(SchemaKind::PipesDrain), 200.0);
        assert_eq!(flange_max(SchemaKind::PipesReturn), 100.0);
        assert_eq!(flange_max(SchemaKind::PipesNozzleClosedLoop), 100.0);
    }

    #[test]
    fn plumbing_entries_are_unique_and_declared() {
        let set = build_standard().expect("standard schemas should be valid");
        let plumbing = set.categories().get(Category::Plumbing);
        let unique: HashSet<_> = plumbing.iter().collect();
        assert_eq!(unique.len(), plumbing.len());
        for (kind, name) in plumbing {
            assert!(
                set.value(*kind, name).is_some(),
                "{kind}.{name} is categorized but not declared"
            );
        }
        // 8 values for each of the three pipe families plus Config entries.
        assert!(plumbing.len() > 24);
    }

    #[test]
    fn every_category_is_used() {
        let set = build_standard().expect("standard schemas should be valid");
        for category in Category::ALL {
            assert!(
                !set.categories().get(category).is_empty(),
                "{category} has no entries"
            );
        }
    }

    #[test]
    fn standard_schemas_are_shared() {
        let first = standard_schemas().expect("valid");
        let second = standard_schemas().expect("valid");
        assert!(std::sync::Arc::ptr_eq(&first, &second));
    }
}
