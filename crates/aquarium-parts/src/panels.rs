//! Cover panels around the stand and the canopy.

use crate::assembly::Assembly;
use crate::error::PartsError;
use crate::fastener::{Support, supports};
use crate::feature::panel;

pub const STAND: &str = "StandPanels";
pub const CANOPY: &str = "CanopyPanels";

const T: &str = "Config.PanelThickness";

/// Stand cover from just above the floor to the visible stand height, with
/// the screw blocks matching the structure's mount plates.
pub fn stand(assembly: &mut Assembly) -> Result<(), PartsError> {
    cover(
        assembly,
        STAND,
        "StandCover",
        "Config.Panel2FloorSpace",
        "Config.StandVisibleHeight-Config.Panel2FloorSpace",
    )?;
    supports(assembly, STAND, "ScrewBlock", Support::ScrewBlock)
}

pub fn canopy(assembly: &mut Assembly) -> Result<(), PartsError> {
    cover(
        assembly,
        CANOPY,
        "CanopyCover",
        "Computed.CanopyPanelLevel",
        "Computed.CanopyPanelHeight",
    )
}

/// Four panels wrapping the footprint; the left, right and front ones
/// overlap the corners by one panel thickness.
fn cover(assembly: &mut Assembly, group: &str, suffix: &str, z: &str, height: &str) -> Result<(), PartsError> {
    let outer_left = format!("Computed.LeftCornerX-{T}");
    let side_length = format!("Config.Length+{T}");
    let front_width = format!("Config.Width+2*{T}");
    let front_y = format!("Computed.FrontCornerY-{T}");
    let panels: [(&str, [&str; 2], [&str; 2]); 4] = [
        ("Left", [&outer_left, "Computed.FrontCornerY"], [T, &side_length]),
        ("Right", ["Computed.RightCornerX", "Computed.FrontCornerY"], [T, &side_length]),
        ("Back", ["Computed.LeftCornerX", "Computed.BackCornerY"], ["Config.Width", T]),
        ("Front", [&outer_left, &front_y], [&front_width, T]),
    ];
    for (side, [x, y], [length, width]) in panels {
        assembly.add(
            group,
            panel(&format!("{side}{suffix}"), [x, y, z], [length, width, height])?,
        )?;
    }
    Ok(())
}
