//! Glass panels and euro braces.

use aquarium_config::{Configuration, SchemaKind};
use tracing::debug;

use crate::assembly::Assembly;
use crate::error::PartsError;
use crate::feature::{cuboid, panel};

pub const GROUP: &str = "Glasses";

const T: &str = "Config.SidesGlassThickness";
const BRACE: &str = "Config.BraceWidth";
const Z_BOTTOM: &str = "Computed.GlassLevel+Config.BottomGlassThickness";

pub fn generate(config: &Configuration, assembly: &mut Assembly) -> Result<(), PartsError> {
    let cut45 = config.flag(SchemaKind::Config, "GlassCut45")?;
    debug!(cut45, "generating glass");

    assembly.add(
        GROUP,
        panel(
            "BottomGlass",
            ["Computed.LeftCornerX", "-Config.Length/2", "Computed.GlassLevel"],
            ["Config.Width", "Config.Length", "Config.BottomGlassThickness"],
        )?,
    )?;

    if cut45 {
        sides_mitered(assembly)?;
    } else {
        sides_butted(assembly)?;
    }
    bottom_braces(assembly)?;
    top_braces(assembly)?;
    weir_frame(assembly)?;
    Ok(())
}

fn sides_mitered(assembly: &mut Assembly) -> Result<(), PartsError> {
    let sides: [(&str, [String; 3], [&str; 2], &str); 4] = [
        (
            "LeftGlass",
            ["Computed.LeftCornerX".into(), "Config.Length/-2".into(), Z_BOTTOM.into()],
            ["Computed.LeftCornerX", "Config.Length/2"],
            "-45",
        ),
        (
            "RightGlass",
            [format!("Computed.RightCornerX-{T}"), "Config.Length/-2".into(), Z_BOTTOM.into()],
            ["Computed.RightCornerX", "Config.Length/2"],
            "-45",
        ),
        (
            "BackGlass",
            ["Computed.LeftCornerX".into(), format!("Config.Length/2-{T}"), Z_BOTTOM.into()],
            ["Computed.LeftCornerX", "Config.Length/2"],
            "45",
        ),
        (
            "FrontGlass",
            ["Computed.LeftCornerX".into(), "-Config.Length/2".into(), Z_BOTTOM.into()],
            ["Computed.LeftCornerX", "-Config.Length/2"],
            "45",
        ),
    ];
    for (name, [x, y, z], [cut_x, cut_y], yaw) in &sides {
        let along_y = name.starts_with("Left") || name.starts_with("Right");
        let (length, width, span) = if along_y {
            (T, "Config.Length", "Config.Length")
        } else {
            ("Config.Width", T, "Config.Width")
        };
        assembly.add(
            GROUP,
            panel(name, [x, y, z], [length, width, "Computed.RealGlassHeight"])?,
        )?;
        let side = format!("{span}/sqrt(2)");
        assembly.add(
            GROUP,
            cuboid(
                &format!("cut45{name}"),
                [cut_x, cut_y, Z_BOTTOM],
                [&side, "Computed.RealGlassHeight", &side],
            )?
            .of(name)
            .yaw(yaw)?,
        )?;
    }
    Ok(())
}

fn sides_butted(assembly: &mut Assembly) -> Result<(), PartsError> {
    let inner_y = format!("Config.Length/-2+{T}");
    let inner_length = format!("Config.Length-2*{T}");
    assembly.add(
        GROUP,
        panel(
            "LeftGlass",
            ["Computed.LeftCornerX", &inner_y, Z_BOTTOM],
            [T, &inner_length, "Computed.RealGlassHeight"],
        )?,
    )?;
    assembly.add(
        GROUP,
        panel(
            "RightGlass",
            [&format!("Computed.RightCornerX-{T}"), &inner_y, Z_BOTTOM],
            [T, &inner_length, "Computed.RealGlassHeight"],
        )?,
    )?;
    assembly.add(
        GROUP,
        panel(
            "BackGlass",
            ["Computed.LeftCornerX", &format!("Config.Length/2-{T}"), Z_BOTTOM],
            ["Config.Width", T, "Computed.RealGlassHeight"],
        )?,
    )?;
    assembly.add(
        GROUP,
        panel(
            "FrontGlass",
            ["Computed.LeftCornerX", "-Config.Length/2", Z_BOTTOM],
            ["Config.Width", T, "Computed.RealGlassHeight"],
        )?,
    )?;
    Ok(())
}

fn bottom_braces(assembly: &mut Assembly) -> Result<(), PartsError> {
    let inner_y = format!("Config.Length/-2+{T}");
    let inner_length = format!("Config.Length-2*{T}");
    let braces: [(&str, [String; 3], [String; 3]); 5] = [
        (
            "LeftBottomBrace",
            [format!("Computed.LeftCornerX+{T}"), inner_y.clone(), Z_BOTTOM.into()],
            [BRACE.into(), inner_length.clone(), T.into()],
        ),
        (
            "RightBottomBrace",
            [format!("Computed.RightCornerX-{BRACE}-{T}"), inner_y.clone(), Z_BOTTOM.into()],
            [BRACE.into(), inner_length, T.into()],
        ),
        (
            "FrontBottomBrace",
            [format!("Computed.LeftCornerX+{T}+{BRACE}"), format!("-Config.Length/2+{T}"), Z_BOTTOM.into()],
            [format!("Config.Width-2*{BRACE}-2*{T}"), BRACE.into(), T.into()],
        ),
        (
            "BackBottomBrace",
            [format!("Computed.LeftCornerX+2*{T}+{BRACE}"), format!("Config.Length/2-2*{T}"), Z_BOTTOM.into()],
            [format!("Config.Width-2*{BRACE}-4*{T}"), T.into(), BRACE.into()],
        ),
        (
            "BackBottomWeirSupport",
            [
                format!("Computed.LeftCornerX+2*{T}+{BRACE}"),
                format!("Config.Length/2-{T}-Computed.WeirDepth"),
                Z_BOTTOM.into(),
            ],
            [format!("Config.Width-2*{BRACE}-4*{T}"), T.into(), BRACE.into()],
        ),
    ];
    add_all(assembly, &braces)
}

fn top_braces(assembly: &mut Assembly) -> Result<(), PartsError> {
    let z_top = format!("{Z_BOTTOM}+Computed.RealGlassHeight");
    let top_1 = format!("{z_top}-{T}");
    let top_2 = format!("{z_top}-2*{T}");
    let inner_y = format!("Config.Length/-2+{T}");
    let inner_length = format!("Config.Length-2*{T}");
    let braces: [(&str, [String; 3], [String; 3]); 4] = [
        (
            "LeftTopBrace",
            [format!("Computed.LeftCornerX+{T}"), inner_y.clone(), top_2.clone()],
            [BRACE.into(), inner_length.clone(), T.into()],
        ),
        (
            "RightTopBrace",
            [format!("Computed.RightCornerX-{BRACE}-{T}"), inner_y, top_2],
            [BRACE.into(), inner_length, T.into()],
        ),
        (
            "FrontTopBrace",
            [format!("Computed.LeftCornerX+{T}"), format!("-Config.Length/2+{T}"), top_1.clone()],
            [format!("Config.Width-2*{T}"), BRACE.into(), T.into()],
        ),
        (
            "BackTopBrace",
            [
                format!("Computed.LeftCornerX+{T}"),
                format!("Config.Length/2-{T}-Computed.WeirDepth"),
                top_1,
            ],
            [format!("Config.Width-2*{T}"), "Computed.WeirDepth".into(), T.into()],
        ),
    ];
    add_all(assembly, &braces)
}

/// Vertical braces closing the weir box on both sides.
fn weir_frame(assembly: &mut Assembly) -> Result<(), PartsError> {
    let y = format!("Config.Length/2-{T}-Computed.WeirDepth");
    let height = format!("Computed.RealGlassHeight-{T}");
    let frame: [(&str, [String; 3], [String; 3]); 2] = [
        (
            "WeirFrameLeftBrace",
            [format!("Computed.LeftCornerX+{T}+{BRACE}"), y.clone(), Z_BOTTOM.into()],
            [T.into(), "Computed.WeirDepth".into(), height.clone()],
        ),
        (
            "WeirFrameRightBrace",
            [format!("Computed.RightCornerX-2*{T}-{BRACE}"), y, Z_BOTTOM.into()],
            [T.into(), "Computed.WeirDepth".into(), height],
        ),
    ];
    add_all(assembly, &frame)
}

fn add_all(assembly: &mut Assembly, panels: &[(&str, [String; 3], [String; 3])]) -> Result<(), PartsError> {
    for (name, [x, y, z], [length, width, height]) in panels {
        assembly.add(GROUP, panel(name, [x, y, z], [length, width, height])?)?;
    }
    Ok(())
}
