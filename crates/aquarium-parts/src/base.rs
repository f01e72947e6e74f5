//! Leveling boards under the tank and under the sump.

use crate::assembly::Assembly;
use crate::error::PartsError;
use crate::feature::panel;

pub const GROUP: &str = "LevelingBase";

pub fn generate(assembly: &mut Assembly) -> Result<(), PartsError> {
    assembly.add(
        GROUP,
        panel(
            "BottomBase",
            ["Computed.LeftCornerX", "-Computed.Length/2", "Computed.UnderGlassBaseLevel"],
            ["Computed.Width", "Computed.Length", "Config.UnderGlassLevelingBaseThickness"],
        )?,
    )?;
    assembly.add(
        GROUP,
        panel(
            "BottomBaseSump",
            [
                "Computed.LeftCornerX+Config.MetalProfileHeight",
                "-Computed.Length/2+Config.MetalProfileHeight",
                "Computed.UnderBaseLevelSump",
            ],
            [
                "Computed.Width-2*Config.MetalProfileHeight",
                "Computed.Length-2*Config.MetalProfileHeight",
                "Config.UnderGlassLevelingBaseThickness",
            ],
        )?,
    )?;
    Ok(())
}
