//! Corner fasteners joining the stand structure and its cover panels.

use crate::assembly::Assembly;
use crate::error::PartsError;
use crate::feature::{Axis, cuboid, hole, ortho_array};

/// Which side of the joint a fastener belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Drilled mount plate welded to the structure.
    MountPlate,
    /// Screw block glued to the cover panels.
    ScrewBlock,
}

impl Support {
    fn thickness(self) -> &'static str {
        match self {
            Support::MountPlate => "Config.PanelMountThickness",
            Support::ScrewBlock => "Config.PanelBlockThickness",
        }
    }
}

/// Eight fastener positions (two per corner), each at the top and the bottom
/// of the stand.
pub fn supports(assembly: &mut Assembly, group: &str, prefix: &str, support: Support) -> Result<(), PartsError> {
    let t = support.thickness();
    let corners: [(String, String); 8] = [
        ("Computed.LeftCornerX".into(), "Computed.FrontCornerY".into()),
        ("Computed.RightCornerX".into(), "Computed.FrontCornerY".into()),
        ("Computed.RightCornerX".into(), "Computed.BackCornerY".into()),
        ("Computed.LeftCornerX".into(), "Computed.BackCornerY".into()),
        ("Computed.LeftCornerX".into(), format!("Computed.BackCornerY-{t}")),
        (format!("Computed.LeftCornerX+{t}"), "Computed.FrontCornerY".into()),
        ("Computed.RightCornerX".into(), format!("Computed.FrontCornerY+{t}")),
        (format!("Computed.RightCornerX-{t}"), "Computed.BackCornerY".into()),
    ];
    for (direction, (x, y)) in corners.iter().enumerate() {
        for top in [true, false] {
            fastener(assembly, group, prefix, support, x, y, direction, top)?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn fastener(
    assembly: &mut Assembly,
    group: &str,
    prefix: &str,
    support: Support,
    x: &str,
    y: &str,
    direction: usize,
    top: bool,
) -> Result<(), PartsError> {
    let name = format!("{prefix}{direction}{}", if top { "Top" } else { "Bottom" });
    let mut x = x.to_string();
    let mut y = y.to_string();

    if support == Support::MountPlate {
        match direction {
            0 | 6 => y.push_str("+Config.PanelMountInset"),
            1 | 7 => x.push_str("-Config.PanelMountInset"),
            2 | 4 => y.push_str("-Config.PanelMountInset"),
            _ => x.push_str("+Config.PanelMountInset"),
        }
    }
    let quarter = direction % 4;
    match quarter {
        0 => x.push_str("+Config.MetalProfileWidth"),
        1 => y.push_str("+Config.MetalProfileHeight"),
        2 => x.push_str("-Config.MetalProfileWidth"),
        _ => y.push_str("-Config.MetalProfileHeight"),
    }
    let z = if top {
        "Computed.ColumnsSizeHeight-Computed.PanelFastenerSizeVertical"
    } else {
        "Computed.SumpBeamsLevel+Config.MetalProfileWidth/2"
    };

    let plate = cuboid(
        &name,
        [&x, &y, z],
        [
            "Computed.PanelFastenerSizeHorizontal",
            support.thickness(),
            "Computed.PanelFastenerSizeVertical",
        ],
    )?
    .yaw(&(quarter * 90).to_string())?;
    assembly.add(group, plate)?;

    // Hole offsets are local to the plate.
    let (hole_y, hole_depth) = match support {
        Support::MountPlate => ("2*Config.PanelMountThickness", "Config.PanelMountThickness*3"),
        Support::ScrewBlock if direction <= 3 => (
            "Config.PanelMountThickness+Config.PanelMountThickness*10",
            "Config.PanelMountThickness*10",
        ),
        Support::ScrewBlock => ("Config.PanelMountThickness", "Config.PanelMountThickness*10"),
    };
    let hole_name = format!("{name}Hole");
    assembly.add(
        group,
        hole(
            &hole_name,
            [
                "Config.PanelMountHoleBorderSpacing",
                hole_y,
                "Config.PanelMountHoleBorderSpacing",
            ],
            "Config.PanelMountHoleDiameter/2",
            hole_depth,
        )?,
    )?;
    assembly.add(
        group,
        ortho_array(&format!("{name}Holes"), &hole_name)
            .repeat(
                Axis::X,
                "Config.PanelMountHoleSpacing",
                "Config.PanelMountHoleCountHorizontal",
            )?
            .repeat(
                Axis::Z,
                "Config.PanelMountHoleSpacing",
                "Config.PanelMountHoleCountVertical",
            )?,
    )?;
    Ok(())
}
