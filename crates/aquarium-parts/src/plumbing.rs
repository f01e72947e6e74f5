//! Flanges through the bottom glass, weir pipes and the closed loop nozzles.

use aquarium_config::SchemaKind;
use tracing::debug;

use crate::assembly::Assembly;
use crate::error::PartsError;
use crate::feature::{Axis, cylinder, hole, ortho_array, pipe};

pub const FLANGES: &str = "Flanges";
pub const PIPES: &str = "Pipes";
pub const CLOSED_LOOP: &str = "ClosedLoop";

/// Hands out consecutive flange indices; each index places a flange along the weir.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlangeCounter {
    next: usize,
}

impl FlangeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next free index and reserves it.
    pub fn take(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }

    /// Number of indices handed out so far.
    pub fn count(&self) -> usize {
        self.next
    }
}

/// Weir flanges from left to right.
const WEIR_FLANGES: [SchemaKind; 6] = [
    SchemaKind::PipesReturn,
    SchemaKind::PipesDrain,
    SchemaKind::PipesDrain,
    SchemaKind::PipesDrain,
    SchemaKind::PipesDrain,
    SchemaKind::PipesReturn,
];

/// Pipe family and the water level each weir pipe reaches, by flange index.
const WEIR_PIPES: [(SchemaKind, &str); 6] = [
    (SchemaKind::PipesReturn, "ReturnWaterLevel"),
    (SchemaKind::PipesDrain, "BeanAnimalMainDrainLevel"),
    (SchemaKind::PipesDrain, "BeanAnimalEmergencyDrainLevel"),
    (SchemaKind::PipesDrain, "BeanAnimalEmergencyDrainLevel"),
    (SchemaKind::PipesDrain, "BeanAnimalAuxiliaryDrainLevel"),
    (SchemaKind::PipesReturn, "ReturnWaterLevel"),
];

fn family(kind: SchemaKind) -> &'static str {
    kind.sheet_name()
        .strip_prefix("ConfigPipes")
        .unwrap_or(kind.sheet_name())
}

fn slot_x(index: usize) -> String {
    format!("Computed.StartPipes+{index}*Computed.WeirFlangeOffset")
}

/// Names of the pieces of one flange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlangeParts {
    pub head: String,
    pub hole_glass: String,
    pub hole_base: String,
}

/// Adds a flange at `(x, y)` with its glass and base holes. `x` defaults to
/// the weir slot of `index` and `y` to the flange line.
pub fn flange(
    assembly: &mut Assembly,
    group: &str,
    kind: SchemaKind,
    index: usize,
    x: Option<&str>,
    y: Option<&str>,
) -> Result<FlangeParts, PartsError> {
    let family_name = family(kind);
    let sheet = kind.sheet_name();
    let x = x.map_or_else(|| slot_x(index), str::to_string);
    let y = y.unwrap_or("Computed.FlangesY");

    let tail_radius = format!("{sheet}.FlangeFreeDiameterBottom/2");
    let neck_radius = format!("{sheet}.FlangeDiameter/2");
    let tail_z = format!("Computed.FlangesZ-{sheet}.FlangeFreeHeightBottom-Computed.FlangesNeckHeight");

    assembly.add(
        group,
        cylinder(
            &format!("Flange{family_name}Tail_{index}"),
            [&x, y, &tail_z],
            &tail_radius,
            &format!("{sheet}.FlangeFreeHeightBottom"),
        )?,
    )?;
    let head = format!("Flange{family_name}Head_{index}");
    assembly.add(
        group,
        cylinder(
            &head,
            [&x, y, "Computed.FlangesZ"],
            &format!("{sheet}.FlangeFreeDiameterTop/2"),
            &format!("{sheet}.FlangeFreeHeightTop"),
        )?,
    )?;
    assembly.add(
        group,
        cylinder(
            &format!("Flange{family_name}Neck_{index}"),
            [&x, y, "Computed.FlangesZ-Computed.FlangesNeckHeight"],
            &neck_radius,
            "Computed.FlangesNeckHeight",
        )?,
    )?;

    // Holes run from the floor through the top of the glass.
    let through = "Computed.RealGlassHeight+Config.StandVisibleHeight";
    let hole_glass = format!("HoleGlass{family_name}_{index}");
    assembly.add(group, hole(&hole_glass, [&x, y, "0"], &neck_radius, through)?)?;
    let hole_base = format!("HoleBase{family_name}_{index}");
    assembly.add(group, hole(&hole_base, [&x, y, "0"], &tail_radius, through)?)?;

    Ok(FlangeParts {
        head,
        hole_glass,
        hole_base,
    })
}

/// The six weir flanges, indexed by `counter`.
pub fn flanges(assembly: &mut Assembly, counter: &mut FlangeCounter) -> Result<(), PartsError> {
    for kind in WEIR_FLANGES {
        let index = counter.take();
        flange(assembly, FLANGES, kind, index, None, None)?;
    }
    debug!(count = counter.count(), "placed weir flanges");
    Ok(())
}

/// One pipe per weir flange, rising to the water level of its role.
pub fn pipes(assembly: &mut Assembly) -> Result<(), PartsError> {
    for (index, (kind, level)) in WEIR_PIPES.into_iter().enumerate() {
        let sheet = kind.sheet_name();
        let base = format!("{sheet}.FlangeFreeHeightTop-{sheet}.FlangePipeLengthInside");
        let length = format!("Config.{level}+Computed.WaterLevelDeepest-({base}+Computed.FlangesZ)");
        assembly.add(
            PIPES,
            pipe(
                &format!("PipesWeir{}_{index}", family(kind)),
                [&slot_x(index), "Computed.FlangesY", &format!("Computed.FlangesZ+{base}")],
                &length,
                &format!("{sheet}.PipeDiameter"),
            )?,
        )?;
    }
    Ok(())
}

/// Closed loop nozzle flange replicated over the nozzle grid.
pub fn nozzles(assembly: &mut Assembly) -> Result<(), PartsError> {
    let parts = flange(
        assembly,
        CLOSED_LOOP,
        SchemaKind::PipesNozzleClosedLoop,
        1,
        Some("Computed.NozzlesBaseX"),
        Some("Computed.NozzlesBaseY"),
    )?;
    for (name, source) in [
        ("Nozzles", &parts.head),
        ("NozzleHolesGlass", &parts.hole_glass),
        ("NozzleHolesBase", &parts.hole_base),
    ] {
        assembly.add(
            CLOSED_LOOP,
            ortho_array(name, source)
                .repeat(Axis::X, "Computed.NozzlesSpacingX", "Computed.NozzlesNumberX")?
                .repeat(Axis::Y, "Computed.NozzlesSpacingY", "Computed.NozzlesNumberY")?,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{FlangeCounter, flanges, nozzles, pipes};
    use crate::assembly::Assembly;

    #[test]
    fn counter_hands_out_consecutive_indices() {
        let mut counter = FlangeCounter::new();
        assert_eq!(counter.take(), 0);
        assert_eq!(counter.take(), 1);
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn weir_flanges_follow_the_return_drain_layout() {
        let mut assembly = Assembly::new();
        let mut counter = FlangeCounter::new();
        flanges(&mut assembly, &mut counter).expect("flanges");
        assert_eq!(counter.count(), 6);
        assert!(assembly.feature("FlangeReturnHead_0").is_some());
        assert!(assembly.feature("FlangeDrainHead_1").is_some());
        assert!(assembly.feature("FlangeDrainHead_4").is_some());
        assert!(assembly.feature("FlangeReturnHead_5").is_some());
        let head = assembly.feature("FlangeDrainHead_3").expect("head");
        assert_eq!(
            head.binding("x").map(|b| b.formula().source()),
            Some("Computed.StartPipes+3*Computed.WeirFlangeOffset")
        );
    }

    #[test]
    fn pipe_levels_follow_the_flange_roles() {
        let mut assembly = Assembly::new();
        pipes(&mut assembly).expect("pipes");
        let main = assembly.feature("PipesWeirDrain_1").expect("main drain");
        assert_eq!(
            main.binding("length").map(|b| b.formula().source()),
            Some(
                "Config.BeanAnimalMainDrainLevel+Computed.WaterLevelDeepest-(ConfigPipesDrain.FlangeFreeHeightTop-ConfigPipesDrain.FlangePipeLengthInside+Computed.FlangesZ)"
            )
        );
        assert!(assembly.feature("PipesWeirReturn_5").is_some());
    }

    #[test]
    fn nozzles_use_an_explicit_index_and_arrays() {
        let mut assembly = Assembly::new();
        nozzles(&mut assembly).expect("nozzles");
        let head = assembly
            .feature("FlangeNozzleClosedLoopHead_1")
            .expect("nozzle head");
        assert_eq!(
            head.binding("x").map(|b| b.formula().source()),
            Some("Computed.NozzlesBaseX")
        );
        let array = assembly.feature("Nozzles").expect("array");
        assert_eq!(array.source(), Some("FlangeNozzleClosedLoopHead_1"));
    }
}
