//! Overflow weir: wall, slots, fasteners and bulkhead openings.

use crate::assembly::Assembly;
use crate::error::PartsError;
use crate::feature::{Feature, FeatureKind, Measure, linear_pattern, sketch};

pub const GROUP: &str = "Weir";

const T: &str = "Config.SidesGlassThickness";
const BULKHEAD_CENTER: &str = "Computed.RealGlassHeight-Config.BulkHeadDiameter/2-Config.SidesGlassThickness-Config.WeirSlotWidth*1.5";
const BULKHEAD_X: &str = "Computed.BulkHeadSpace/2+Config.BraceWidth+2*Config.SidesGlassThickness";
const FASTENER_Y: &str = "Computed.RealGlassHeight-Config.SidesGlassThickness-Config.WeirFastenerOffset";

pub fn generate(assembly: &mut Assembly) -> Result<(), PartsError> {
    assembly.add(
        GROUP,
        sketch("WeirWall")
            .at(
                "Computed.LeftCornerX",
                &format!("Computed.Length/2-{T}-Computed.WeirDepth"),
                "(Computed.GlassLevel+Config.BottomGlassThickness)*1 mm",
            )?
            .dimension("left", "Computed.WeirMargin")?
            .dimension("right", "Computed.WeirWidth+Computed.WeirMargin")?
            .dimension("height", "Computed.RealGlassHeight")?
            .dimension("thickness", "Config.WeirWallThickness")?,
    )?;

    assembly.add(
        GROUP,
        sketch("WeirSlot")
            .dimension("width", "Config.WeirSlotWidth")?
            .dimension("depth", "Config.WaterHeightWeir")?
            .bind(
                "top",
                Measure::Position,
                &format!("Computed.RealGlassHeight-{T}-Config.WeirSlotWidth*0.5"),
            )?
            .bind(
                "offset",
                Measure::Position,
                &format!("2*{T}+Config.BraceWidth+Config.WeirSlotWidth*0.5"),
            )?,
    )?;
    assembly.add(
        GROUP,
        linear_pattern(
            "WeirSlots",
            "WeirSlot",
            "Computed.WeirInsideWidth-Config.WeirSlotWidth",
            "Computed.WeirSlotCount",
        )?,
    )?;

    let fastener_x = format!("Computed.WeirMargin+{T}+Config.WeirFastenerOffset");
    assembly.add(
        GROUP,
        sketch("WeirFastenerReinforcement")
            .dimension("diameter", "2*Config.WeirFastenerDiameter")?
            .bind("top", Measure::Position, FASTENER_Y)?
            .bind("offset", Measure::Position, &fastener_x)?
            .dimension("thickness", "Config.WeirWallThickness")?,
    )?;
    assembly.add(
        GROUP,
        linear_pattern(
            "WeirFastenerReinforcements",
            "WeirFastenerReinforcement",
            "Computed.WeirHorizontalFastenerWidth",
            "Config.WeirFastenerHorizontalCount",
        )?,
    )?;
    assembly.add(
        GROUP,
        Feature::new("WeirFastener", FeatureKind::Hole)
            .dimension("diameter", "Config.WeirFastenerDiameter")?
            .bind("top", Measure::Position, FASTENER_Y)?
            .bind("bottom", Measure::Position, "Config.BraceWidth+Config.WeirFastenerOffset")?
            .bind("offset", Measure::Position, &fastener_x)?,
    )?;
    assembly.add(
        GROUP,
        linear_pattern(
            "WeirFasteners",
            "WeirFastener",
            "Computed.WeirHorizontalFastenerWidth",
            "Config.WeirFastenerHorizontalCount",
        )?,
    )?;

    assembly.add(
        GROUP,
        sketch("BulkHeadReinforcement")
            .dimension("outer_diameter", "Config.BulkHeadDiameter+5")?
            .dimension("inner_diameter", "max(0;Config.BulkHeadDiameter-5)")?
            .bind("center", Measure::Position, BULKHEAD_CENTER)?
            .bind("offset", Measure::Position, BULKHEAD_X)?
            .dimension("thickness", "Config.WeirWallThickness")?,
    )?;
    assembly.add(
        GROUP,
        linear_pattern(
            "BulkHeadReinforcements",
            "BulkHeadReinforcement",
            "Computed.BulkHeadsLength",
            "Config.BulkHeadNumber",
        )?,
    )?;
    assembly.add(
        GROUP,
        Feature::new("BulkHeadHole", FeatureKind::Hole)
            .dimension("diameter", "Config.BulkHeadDiameter")?
            .bind("center", Measure::Position, BULKHEAD_CENTER)?
            .bind("offset", Measure::Position, BULKHEAD_X)?,
    )?;
    assembly.add(
        GROUP,
        linear_pattern(
            "BulkHeads",
            "BulkHeadHole",
            "Computed.BulkHeadsLength",
            "Config.BulkHeadNumber",
        )?,
    )?;
    Ok(())
}
