//! Plain-text rendering of previews and deployment reports.

use std::fmt::Write as _;

use formation_catalog::Catalog;
use formation_core::{TileIndex, GRID_COLUMNS};
use formation_system_deployment::DeploymentReport;

use crate::session::Session;

/// Colour tier the preview assigns to a stack count.
pub(crate) fn tier_label(stack_count: u32) -> &'static str {
    match stack_count {
        0 => "-",
        1 => "1",
        2 => "2",
        3 => "3",
        4 => "4",
        _ => "5+",
    }
}

pub(crate) fn render_preview(session: &Session, catalog: &Catalog) -> String {
    let mut out = String::new();
    if let Some(stage) = session.stage() {
        let name = catalog
            .stage(stage.stage_type)
            .map_or("custom stage", |entry| entry.name.as_str());
        let _ = writeln!(
            out,
            "stage {} ({name}): {} placed, cap {}",
            stage.stage_type.get(),
            session.placements().len(),
            stage.max_deploy()
        );
    }

    let mask = session.mask();
    let accumulations = session.accumulations();
    let tiles: Vec<TileIndex> = TileIndex::all().collect();
    for row in tiles.chunks(GRID_COLUMNS) {
        let cells: Vec<String> = row
            .iter()
            .map(|&tile| {
                if !mask.is_enabled(tile) {
                    return "  x ".to_owned();
                }
                let occupied = if session.placements().unit_at(tile).is_some() {
                    '*'
                } else {
                    ' '
                };
                format!("{occupied}{:>2} ", tier_label(accumulations.stack_count(tile)))
            })
            .collect();
        let _ = writeln!(out, "{}", cells.concat().trim_end());
    }

    for (tile, accumulation) in accumulations.iter() {
        if accumulation.stack_count == 0 {
            continue;
        }
        let effects: Vec<String> = accumulation
            .effects
            .iter()
            .map(|slot| format!("{}:{}", slot.effect.get(), slot.magnitude))
            .collect();
        let _ = writeln!(
            out,
            "tile {:>2}: stack {} tier {} effects [{}]",
            tile.get(),
            accumulation.stack_count,
            tier_label(accumulation.stack_count),
            effects.join(", ")
        );
    }

    let active = session.active_synergies();
    if active.is_empty() {
        let _ = writeln!(out, "synergies: none");
    } else {
        for definition in active.iter() {
            let _ = writeln!(
                out,
                "synergy {} ({}) scope {:?}",
                definition.id.get(),
                definition.name,
                definition.scope
            );
        }
    }
    out
}

pub(crate) fn render_deployment(report: &DeploymentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "deployed {} units ({} refused)",
        report.requests - report.instantiation_failures,
        report.instantiation_failures
    );
    let ids: Vec<String> = report
        .synergies
        .iter()
        .map(|synergy| synergy.get().to_string())
        .collect();
    let _ = writeln!(out, "synergies: [{}]", ids.join(", "));
    let _ = writeln!(
        out,
        "effects: {} ally, {} global, {} failed",
        report.synergy_effects.ally_effects,
        report.synergy_effects.global_effects,
        report.synergy_effects.failures
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use formation_core::{to_index, Command, StageConfig, StageType, UnitId};

    #[test]
    fn tiers_saturate_at_five() {
        assert_eq!(tier_label(0), "-");
        assert_eq!(tier_label(4), "4");
        assert_eq!(tier_label(5), "5+");
        assert_eq!(tier_label(12), "5+");
    }

    #[test]
    fn preview_marks_disabled_tiles_and_coverage() {
        let catalog = Catalog::builtin().expect("builtin catalog parses");
        let mut session = Session::new(&catalog);
        let _ = session.submit(Command::LoadStage {
            stage: StageConfig::new(StageType::new(2), 4),
        });
        let _ = session.submit(Command::PlaceUnit {
            unit: UnitId::new(1001),
            tile: to_index(0, 2),
        });

        let preview = render_preview(&session, &catalog);
        let lines: Vec<&str> = preview.lines().collect();

        assert!(lines[0].starts_with("stage 2 (Narrow Corridor): 1 placed"));
        assert_eq!(lines[1], "  x   - * 1   -   x");
        assert!(preview.contains("tile  2: stack 1 tier 1"));
        assert!(preview.contains("tile  7: stack 1 tier 1"));
    }
}
