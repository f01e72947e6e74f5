//! Formulas of the derived `Computed` sheet.

use crate::derived::DerivedSheet;
use crate::error::SheetError;
use crate::workbook::Workbook;

pub const COMPUTED_SHEET: &str = "Computed";

/// Writes every derived formula into the `Computed` sheet of `workbook`.
///
/// Rows are appended after whatever the sheet already holds, so callers
/// only build it once per workbook. Nothing is evaluated here.
pub fn build_computed(workbook: &mut Workbook) -> Result<usize, SheetError> {
    let mut s = DerivedSheet::open(workbook, COMPUTED_SHEET)?;

    s.sep("Inner dimensions")?;
    s.add("Width", "=Config.Width-2*Config.PanelThickness")?;
    s.add("Length", "=Config.Length-2*Config.PanelThickness")?;
    s.add("BeamsDir", "=Computed.Width>Computed.Length?0:1")?;
    s.add(
        "PanelFastenerSizeVertical",
        "=Config.PanelMountHoleBorderSpacing*2+Config.PanelMountHoleSpacing*(Config.PanelMountHoleCountVertical-1)",
    )?;
    s.add(
        "PanelFastenerSizeHorizontal",
        "=Config.PanelMountHoleBorderSpacing*2+Config.PanelMountHoleSpacing*(Config.PanelMountHoleCountHorizontal-1)",
    )?;

    s.sep("Levels")?;
    s.add_described(
        "SumpBeamsLevel",
        "=Config.Sump2FloorSpaceForBroom+Config.MetalProfileWidth/2",
        "Level of center of sump beams",
    )?;
    s.add_described(
        "WaterLevelDeepest",
        "=Config.StandVisibleHeight-Config.HideExtraBottom-Config.SidesGlassThickness",
        "Level of the base glass",
    )?;
    s.add_described(
        "GlassLevel",
        "=WaterLevelDeepest-Config.BottomGlassThickness",
        "Level of the deepest water inside glass (pipes can go deeper)",
    )?;
    s.add_described(
        "UnderGlassBaseLevel",
        "=GlassLevel-Config.UnderGlassLevelingBaseThickness",
        "Level of the base that distributes the weight to the structure",
    )?;
    s.add_described(
        "BeamsLevel",
        "=UnderGlassBaseLevel-Config.MetalProfileWidth/2",
        "Level of center of stand beams",
    )?;
    s.add_described(
        "SumpBoardLevel",
        "=Config.Sump2FloorSpaceForBroom+Config.MetalProfileWidth",
        "Level of sump base board",
    )?;
    s.add_described(
        "UnderBaseLevelSump",
        "=SumpBoardLevel",
        "Level of the leveling board under the sump",
    )?;
    s.add_described(
        "RealGlassHeight",
        "=Config.VisibleHeightGlass+Config.HideExtraTop+Config.HideExtraBottom+3*Config.SidesGlassThickness",
        "Real height of glass panels",
    )?;

    s.sep("Corners")?;
    s.add_described("RightCornerX", "=+Computed.Width/2", "Coordinate of corner")?;
    s.add_described("LeftCornerX", "=-Computed.Width/2", "Coordinate of corner")?;
    s.add_described("FrontCornerY", "=-Computed.Length/2", "Coordinate of corner")?;
    s.add_described("BackCornerY", "=+Computed.Length/2", "Coordinate of corner")?;

    s.sep("Beams")?;
    s.add_described(
        "BeamsSumpSizeWidth",
        "=Computed.Width-2*Config.MetalProfileWidth",
        "Length of sump beams along the width",
    )?;
    s.add_described(
        "BeamsSumpSizeLength",
        "=Computed.Length-2*Config.MetalProfileHeight",
        "Length of sump beams along the length",
    )?;
    s.add_described(
        "BeamsSizeWidth",
        "=Computed.Width-Config.MetalProfileWidth",
        "Length of beams along the width",
    )?;
    s.add_described(
        "BeamsSizeWidth45",
        "=Computed.Width",
        "Length of mitered beams along the width",
    )?;
    s.add_described(
        "BeamsSizeLength",
        "=Computed.Length",
        "Length of beams along the length",
    )?;
    s.add_described(
        "BeamsSizeMiddle",
        "=min(Computed.Width;Computed.Length)-Config.MetalProfileWidth",
        "Length of the cross beams",
    )?;
    s.add(
        "SumpBeamSpacing",
        "=((BeamsDir>0?Computed.Length:Computed.Width)-Config.MetalProfileHeight)/max(1;Config.BeamsSumpCount+1)",
    )?;
    s.add(
        "StandBeamSpacing",
        "=((BeamsDir>0?Computed.Length:Computed.Width)-Config.MetalProfileHeight)/max(1;Config.BeamsStandCount+1)",
    )?;

    s.sep("Nozzles")?;
    s.add(
        "NozzlesStart",
        "=abs(StandBeamSpacing)*(Config.NozzlesSkipBefore+0.5)+Config.MetalProfileHeight/2",
    )?;
    s.add(
        "NozzlesEnd",
        "=abs(StandBeamSpacing)*(Config.NozzlesSkipAfter+0.5)",
    )?;
    s.add(
        "NozzlesCount",
        "=1+((BeamsDir>0?Computed.Length:Computed.Width)-NozzlesStart-NozzlesEnd)/max(1;abs(StandBeamSpacing*Config.NozzlesEveryXBeamSpace))",
    )?;
    s.add(
        "NozzlesSpacingRows",
        "=(BeamsDir>0?Computed.Width:Computed.Length-WeirDepth)/max(Config.NozzlesRows;1)",
    )?;
    s.add(
        "NozzlesSpacingY",
        "=BeamsDir>0?StandBeamSpacing*Config.NozzlesEveryXBeamSpace:NozzlesSpacingRows",
    )?;
    s.add(
        "NozzlesSpacingX",
        "=BeamsDir>0?NozzlesSpacingRows:StandBeamSpacing*Config.NozzlesEveryXBeamSpace",
    )?;
    s.add("NozzlesNumberY", "=BeamsDir>0?NozzlesCount:Config.NozzlesRows")?;
    s.add("NozzlesNumberX", "=BeamsDir>0?Config.NozzlesRows:NozzlesCount")?;
    s.add(
        "NozzlesBaseX",
        "=LeftCornerX+(BeamsDir>0?NozzlesSpacingRows:StandBeamSpacing)/2+(BeamsDir>0?0:Config.MetalProfileHeight/2)",
    )?;
    s.add(
        "NozzlesBaseY",
        "=FrontCornerY+(BeamsDir>0?StandBeamSpacing:NozzlesSpacingRows)/2+(BeamsDir>0?Config.MetalProfileHeight/2:0)",
    )?;
    s.add_described(
        "ColumnsSizeHeight",
        "=UnderGlassBaseLevel-Config.MetalProfileWidth",
        "Length of columns",
    )?;

    s.sep("Flanges")?;
    s.add(
        "FlangesNeckHeight",
        "=Config.SidesGlassThickness+Config.BottomGlassThickness",
    )?;
    s.add(
        "FlangesFreeByHeadDrain",
        "=ConfigPipesDrain.FlangeFreeDiameterTop/2+Config.SidesGlassThickness",
    )?;
    s.add(
        "FlangesFreeByPipeDrain",
        "=ConfigPipesDrain.PipeDiameter/2+Config.MetalProfileHeight",
    )?;
    s.add(
        "FlangesFreeByTailDrain",
        "=ConfigPipesDrain.FlangeFreeDiameterBottom/2",
    )?;
    s.add(
        "FlangesFreeByHeadReturn",
        "=ConfigPipesReturn.FlangeFreeDiameterTop/2+Config.SidesGlassThickness",
    )?;
    s.add(
        "FlangesFreeByPipeReturn",
        "=ConfigPipesReturn.PipeDiameter/2+Config.MetalProfileHeight",
    )?;
    s.add(
        "FlangesFreeByTailReturn",
        "=ConfigPipesReturn.FlangeFreeDiameterBottom/2",
    )?;
    s.add(
        "WeirCenter",
        "=max(FlangesFreeByHeadDrain;FlangesFreeByPipeDrain;FlangesFreeByTailDrain;FlangesFreeByHeadReturn;FlangesFreeByPipeReturn;FlangesFreeByTailReturn)",
    )?;
    s.add(
        "FlangesMaxDiameter",
        "=max(ConfigPipesDrain.FlangeFreeDiameterTop;ConfigPipesDrain.FlangeFreeDiameterBottom;ConfigPipesReturn.FlangeFreeDiameterTop;ConfigPipesReturn.FlangeFreeDiameterBottom)",
    )?;
    s.add("WeirDepth", "=2*(WeirCenter)")?;
    s.add_described(
        "FlangesY",
        "=Computed.Length/2-WeirCenter-Config.SidesGlassThickness",
        "Center of flanges, Y",
    )?;
    s.add_described(
        "FlangesZ",
        "=GlassLevel+FlangesNeckHeight",
        "Center of flanges, Z",
    )?;

    s.sep("Weir")?;
    s.add("WeirMargin", "=Config.BraceWidth+Config.SidesGlassThickness")?;
    s.add("WeirWidth", "=Computed.Width-2*WeirMargin")?;
    s.add("WeirInsideWidth", "=WeirWidth-2*Config.SidesGlassThickness")?;
    s.add_described(
        "WeirHorizontalFastenerWidth",
        "=WeirInsideWidth-2*Config.WeirFastenerOffset",
        "Span covered by the fasteners along the weir top",
    )?;
    s.add_described(
        "WeirSlotCount",
        "=(WeirInsideWidth-Config.WeirSlotWidth)/max(1;2*Config.WeirSlotWidth)",
        "Number of overflow slots",
    )?;
    s.add(
        "StartPipes",
        "=LeftCornerX+(Config.BraceWidth+2*Config.SidesGlassThickness+FlangesMaxDiameter/2)",
    )?;
    s.add("BulkHeadSpace", "=WeirInsideWidth/max(1;Config.BulkHeadNumber)")?;
    s.add_described(
        "BulkHeadsLength",
        "=(Config.BulkHeadNumber-1)*BulkHeadSpace",
        "Distance between the first and last bulkhead",
    )?;
    s.add_described("FlangeCount", "0", "Flanges placed by the last generation")?;
    s.add(
        "WeirFlangeOffset",
        "=(WeirInsideWidth-FlangesMaxDiameter)/max(FlangeCount-1;1)",
    )?;

    s.sep("Canopy")?;
    s.add(
        "BeamCanopyFront2BackLength",
        "=Computed.Length-2*Config.CanopyProfileHeight",
    )?;
    s.add(
        "BeamCanopyLeft2RightLength",
        "=Computed.Width-2*Config.CanopyProfileWidth",
    )?;
    s.add_described(
        "CanopyPanelLevel",
        "=Config.StandVisibleHeight+Config.VisibleHeightGlass",
        "Level of the canopy panels",
    )?;
    s.add_described(
        "CanopyPanelHeight",
        "=Config.CanopyHeight",
        "Height of the canopy panels",
    )?;
    s.add_described(
        "CanopyLevel",
        "=CanopyPanelLevel+Config.HideExtraTop+2*Config.SidesGlassThickness",
        "Level of the canopy",
    )?;
    s.add_described(
        "CanopyBeamsLevel",
        "=CanopyPanelLevel+Config.CanopyHeight-Config.CanopyBeams2Top",
        "Level of the canopy beams",
    )?;
    s.add(
        "CanopySpacingX",
        "=(Computed.Width-Config.CanopyProfileHeight)/max(1;Config.CanopyExtraBeams+1)",
    )?;
    s.add("CanopyBeamsX", "=Config.CanopyExtraBeams+2")?;
    s.add(
        "CanopyColumnHeight",
        "=Config.CanopyHeight-Config.HideExtraTop-2*Config.SidesGlassThickness",
    )?;

    Ok(s.rows_written())
}

#[cfg(test)]
mod tests {
    use super::{COMPUTED_SHEET, build_computed};
    use crate::configuration::{Configuration, Edit};
    use crate::error::SheetError;
    use crate::schema::SchemaKind::Config;
    use crate::workbook::Workbook;

    fn configured(edits: &[(&str, f64)]) -> Configuration {
        let mut config = Configuration::new().expect("configuration");
        let edits: Vec<Edit> = edits
            .iter()
            .map(|(name, value)| Edit::new(Config, name, *value))
            .collect();
        config.apply_edits(&edits).expect("edits");
        config
    }

    fn computed(config: &Configuration, name: &str) -> f64 {
        let value = config
            .computed(name)
            .unwrap_or_else(|err| panic!("Computed.{name}: {err}"));
        assert!(value.is_finite(), "Computed.{name} = {value}");
        value
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn formulas_parse_and_aliases_are_unique() {
        let mut workbook = Workbook::new();
        let rows = build_computed(&mut workbook).expect("build");
        let sheet = workbook.sheet(COMPUTED_SHEET).expect("sheet");
        assert_eq!(sheet.row_count(), rows);
        assert!(sheet.aliased().count() > 60);
        assert!(sheet.contains("WeirFlangeOffset"));
        assert!(sheet.contains("BulkHeadsLength"));
    }

    #[test]
    fn only_repository_sheets_are_missing_before_seeding() {
        let mut workbook = Workbook::new();
        build_computed(&mut workbook).expect("build");
        let unresolved = workbook.check_references();
        assert!(!unresolved.is_empty());
        for err in &unresolved {
            let SheetError::UnresolvedReference { reference, .. } = err else {
                panic!("unexpected error {err}");
            };
            assert!(reference.starts_with("Config"), "unexpected {reference}");
        }
    }

    #[test]
    fn sump_without_beams_spans_the_whole_width() {
        let config = configured(&[("BeamsSumpCount", 0.0)]);
        assert_close(computed(&config, "SumpBeamSpacing"), 1170.0 - 30.0);
    }

    #[test]
    fn zero_nozzle_rows_use_the_full_span() {
        let config = configured(&[("NozzlesRows", 0.0)]);
        let span = computed(&config, "Length") - computed(&config, "WeirDepth");
        assert_close(computed(&config, "NozzlesSpacingRows"), span);

        let long = configured(&[("NozzlesRows", 0.0), ("Width", 500.0), ("Length", 1000.0)]);
        assert_eq!(computed(&long, "BeamsDir"), 1.0);
        assert_close(computed(&long, "NozzlesSpacingRows"), 470.0);
    }

    #[test]
    fn canopy_without_extra_beams_spans_the_whole_width() {
        let config = configured(&[("CanopyExtraBeams", 0.0)]);
        assert_close(computed(&config, "CanopySpacingX"), 1170.0 - 20.0);
        assert_eq!(computed(&config, "CanopyBeamsX"), 2.0);
    }

    #[test]
    fn nozzle_count_follows_the_beam_direction() {
        let wide = configured(&[]);
        assert_eq!(computed(&wide, "BeamsDir"), 0.0);
        let spacing = 1140.0 / 6.0;
        assert_close(computed(&wide, "StandBeamSpacing"), spacing);
        assert_close(
            computed(&wide, "NozzlesCount"),
            1.0 + (1170.0 - (spacing * 0.5 + 15.0) - spacing * 0.5) / spacing,
        );

        let long = configured(&[("Width", 500.0), ("Length", 1000.0)]);
        assert_eq!(computed(&long, "BeamsDir"), 1.0);
        let spacing = 940.0 / 6.0;
        assert_close(computed(&long, "StandBeamSpacing"), spacing);
        assert_close(
            computed(&long, "NozzlesCount"),
            1.0 + (970.0 - (spacing * 0.5 + 15.0) - spacing * 0.5) / spacing,
        );
    }

    #[test]
    fn nozzle_count_survives_a_zero_beam_spacing() {
        let config = configured(&[("Width", 60.0), ("Length", 60.0)]);
        assert_eq!(computed(&config, "StandBeamSpacing"), 0.0);
        assert_close(computed(&config, "NozzlesCount"), 1.0 + (30.0 - 15.0));
    }

    #[test]
    fn bulkheads_share_the_weir_width() {
        let config = configured(&[("BulkHeadNumber", 2.0), ("WeirSlotWidth", 1.0)]);
        let inside = computed(&config, "WeirInsideWidth");
        assert_close(computed(&config, "BulkHeadSpace"), inside / 2.0);
        assert_close(computed(&config, "BulkHeadsLength"), inside / 2.0);
        assert_close(computed(&config, "WeirSlotCount"), (inside - 1.0) / 2.0);
    }
}
