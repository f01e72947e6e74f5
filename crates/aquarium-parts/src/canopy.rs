//! Canopy frame above the tank.

use crate::assembly::Assembly;
use crate::error::PartsError;
use crate::feature::{Axis, Profile, beam, column, ortho_array};

pub const GROUP: &str = "CanopyStructure";

const W: &str = "Config.CanopyProfileWidth";
const H: &str = "Config.CanopyProfileHeight";

pub fn generate(assembly: &mut Assembly) -> Result<(), PartsError> {
    let x = format!("Computed.LeftCornerX+{W}");
    for (name, y) in [
        ("CanopyBackBeam", format!("Computed.BackCornerY-{H}/2")),
        ("CanopyFrontBeam", format!("Computed.FrontCornerY+{H}/2")),
    ] {
        assembly.add(
            GROUP,
            beam(
                name,
                Profile::CANOPY,
                [&x, &y, "Computed.CanopyBeamsLevel"],
                "Computed.BeamCanopyLeft2RightLength",
                "0",
            )?,
        )?;
    }

    assembly.add(
        GROUP,
        beam(
            "CanopyCrossBeam",
            Profile::CANOPY,
            [
                &format!("Computed.LeftCornerX+{H}/2"),
                &format!("Computed.BackCornerY-{H}"),
                "Computed.CanopyBeamsLevel",
            ],
            "Computed.BeamCanopyFront2BackLength",
            "-90",
        )?,
    )?;
    assembly.add(
        GROUP,
        ortho_array("CanopyCrossBeams", "CanopyCrossBeam").repeat(
            Axis::X,
            "Computed.CanopySpacingX",
            "Computed.CanopyBeamsX",
        )?,
    )?;

    let left = format!("Computed.LeftCornerX+{W}/2");
    let right = format!("Computed.RightCornerX-{W}/2");
    let front = format!("Computed.FrontCornerY+{H}/2");
    let back = format!("Computed.BackCornerY-{H}/2");
    for (name, x, y) in [
        ("CanopyColumnFrontLeft", &left, &front),
        ("CanopyColumnFrontRight", &right, &front),
        ("CanopyColumnBackLeft", &left, &back),
        ("CanopyColumnBackRight", &right, &back),
    ] {
        assembly.add(
            GROUP,
            column(
                name,
                Profile::CANOPY,
                [x, y, "Computed.CanopyLevel"],
                "Computed.CanopyColumnHeight",
            )?,
        )?;
    }
    Ok(())
}
