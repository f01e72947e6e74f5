//! Metal stand: perimeter beams, columns, sump frame and cross reinforcements.

use aquarium_config::{Configuration, SchemaKind};
use tracing::debug;

use crate::assembly::Assembly;
use crate::error::PartsError;
use crate::fastener::{Support, supports};
use crate::feature::{Axis, Profile, beam, column, cuboid, ortho_array};

pub const GROUP: &str = "StandStructure";
const SUPPORTS: &str = "PanelSupports";

const W: &str = "Config.MetalProfileWidth";
const H: &str = "Config.MetalProfileHeight";

pub fn generate(config: &Configuration, assembly: &mut Assembly) -> Result<(), PartsError> {
    let cut45 = config.flag(SchemaKind::Config, "StandCut45")?;
    debug!(cut45, "generating stand structure");

    width_beam(assembly, "FrontBeam", "Computed.FrontCornerY", &format!("Computed.FrontCornerY+{H}/2"), cut45)?;
    width_beam(assembly, "BackBeam", "Computed.BackCornerY", &format!("Computed.BackCornerY-{H}/2"), cut45)?;
    length_beam(assembly, "LeftBeam", "Computed.LeftCornerX", &format!("Computed.LeftCornerX+{H}/2"), cut45)?;
    length_beam(assembly, "RightBeam", "Computed.RightCornerX", &format!("Computed.RightCornerX-{H}/2"), cut45)?;

    let columns_interval = format!("(Computed.Width-{W})/(Config.ColumnsStandWidthCount+1)");
    assembly.add(
        GROUP,
        column(
            "CornerColumn",
            Profile::METAL,
            [
                &format!("Computed.LeftCornerX+{W}/2"),
                &format!("Computed.FrontCornerY+{H}/2"),
                "0",
            ],
            "Computed.ColumnsSizeHeight",
        )?,
    )?;
    assembly.add(
        GROUP,
        ortho_array("Columns", "CornerColumn")
            .repeat(Axis::X, &columns_interval, "Config.ColumnsStandWidthCount+2")?
            .repeat(Axis::Y, &format!("Computed.Length-{H}"), "2")?,
    )?;

    supports(assembly, SUPPORTS, "Fastener", Support::MountPlate)?;

    assembly.add(
        GROUP,
        beam(
            "SumpWidthBeam",
            Profile::METAL,
            [
                &format!("Computed.LeftCornerX+{W}"),
                &format!("Computed.FrontCornerY+{H}/2"),
                "Computed.SumpBeamsLevel",
            ],
            "Computed.BeamsSumpSizeWidth",
            "0",
        )?,
    )?;
    assembly.add(
        GROUP,
        ortho_array("SumpWidthBeams", "SumpWidthBeam")
            .repeat(Axis::X, &columns_interval, "Config.ColumnsStandWidthCount+1")?
            .repeat(Axis::Y, &format!("Computed.Length-{H}"), "2")?,
    )?;
    for (name, x) in [
        ("SumpLeftBeam", format!("Computed.LeftCornerX+{H}/2")),
        ("SumpRightBeam", format!("Computed.RightCornerX-{H}/2")),
    ] {
        assembly.add(
            GROUP,
            beam(
                name,
                Profile::METAL,
                [&x, &format!("Computed.FrontCornerY+{H}"), "Computed.SumpBeamsLevel"],
                "Computed.BeamsSumpSizeLength",
                "90",
            )?,
        )?;
    }

    reinforcement(assembly, "BaseReinforcement", "Computed.BeamsLevel")?;
    reinforcement(assembly, "SumpReinforcement", "Computed.SumpBeamsLevel")?;
    Ok(())
}

/// Beam along X at `y`; mitered ends span the full width.
fn width_beam(
    assembly: &mut Assembly,
    name: &str,
    corner_y: &str,
    y: &str,
    cut45: bool,
) -> Result<(), PartsError> {
    let (x, length) = if cut45 {
        ("Computed.LeftCornerX".to_string(), "Computed.BeamsSizeWidth45")
    } else {
        (format!("Computed.LeftCornerX+{W}/2"), "Computed.BeamsSizeWidth")
    };
    assembly.add(
        GROUP,
        beam(name, Profile::METAL, [&x, y, "Computed.BeamsLevel"], length, "0")?,
    )?;
    if cut45 {
        miter(assembly, name, ["Computed.LeftCornerX", corner_y], length, "45")?;
    }
    Ok(())
}

/// Beam along Y at `x`.
fn length_beam(
    assembly: &mut Assembly,
    name: &str,
    corner_x: &str,
    x: &str,
    cut45: bool,
) -> Result<(), PartsError> {
    let length = "Computed.BeamsSizeLength";
    assembly.add(
        GROUP,
        beam(
            name,
            Profile::METAL,
            [x, "Computed.FrontCornerY", "Computed.BeamsLevel"],
            length,
            "90",
        )?,
    )?;
    if cut45 {
        miter(assembly, name, [corner_x, "Computed.BackCornerY"], length, "-45")?;
    }
    Ok(())
}

/// Cutting box intersected with a beam to bevel both ends at 45 degrees.
fn miter(
    assembly: &mut Assembly,
    beam_name: &str,
    [x, y]: [&str; 2],
    length: &str,
    yaw: &str,
) -> Result<(), PartsError> {
    let side = format!("{length}/sqrt(2)");
    let cut = cuboid(
        &format!("{beam_name}Miter"),
        [x, y, &format!("Computed.BeamsLevel-{W}/2")],
        [&side, W, &side],
    )?
    .of(beam_name)
    .yaw(yaw)?;
    assembly.add(GROUP, cut)
}

/// Cross beams between the long sides, replicated along the beam direction.
fn reinforcement(assembly: &mut Assembly, name: &str, z: &str) -> Result<(), PartsError> {
    assembly.add(
        GROUP,
        beam(
            name,
            Profile::METAL,
            [
                &format!("Computed.LeftCornerX+(Computed.BeamsDir>0?{H}:Computed.StandBeamSpacing+{H}/2)"),
                &format!("Computed.FrontCornerY+(Computed.BeamsDir>0?Computed.StandBeamSpacing+{H}/2:{H})"),
                z,
            ],
            "Computed.BeamsSizeMiddle",
            "Computed.BeamsDir>0?0:90",
        )?,
    )?;
    assembly.add(
        GROUP,
        ortho_array(&format!("{name}s"), name)
            .repeat(
                Axis::X,
                "Computed.BeamsDir>0?0:Computed.StandBeamSpacing",
                "Computed.BeamsDir>0?1:Config.BeamsStandCount",
            )?
            .repeat(
                Axis::Y,
                "Computed.BeamsDir>0?Computed.StandBeamSpacing:0",
                "Computed.BeamsDir>0?Config.BeamsStandCount:1",
            )?,
    )?;
    Ok(())
}
