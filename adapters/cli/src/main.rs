#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that previews, deploys and shares formations.

mod battle;
mod layout_transfer;
mod report;
mod session;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use formation_catalog::Catalog;
use formation_core::{Command, Event, StageConfig, StageType, TileIndex, UnitId};
use tracing_subscriber::EnvFilter;

use crate::battle::{LoggingInstantiator, LoggingSink};
use crate::layout_transfer::{FormationPlacement, FormationSnapshot};
use crate::session::Session;

/// Squad size assumed for stages the catalog does not describe.
const DEFAULT_MEMBER_COUNT: u32 = 5;

#[derive(Parser, Debug)]
#[command(author, version, about = "Formation placement previewer", long_about = None)]
struct Cli {
    /// TOML catalog supplying units, skills, synergies and stage layouts.
    #[arg(long, env = "FORMATION_CATALOG", global = true)]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Prints per-tile stacking and the active synergies.
    Preview(FormationArgs),
    /// Locks in the formation and hands it to a logging battle layer.
    Deploy(FormationArgs),
    /// Prints a share string for the formation.
    Export(FormationArgs),
}

#[derive(Args, Debug)]
struct FormationArgs {
    /// Stage type to load; defaults to the imported formation's stage.
    #[arg(long)]
    stage: Option<u32>,
    /// Overrides the stage's member count.
    #[arg(long)]
    members: Option<u32>,
    /// Overrides the stage's deploy cap.
    #[arg(long)]
    max_deploy: Option<u32>,
    /// Places a unit on a tile, written as `<unit>@<tile>`.
    #[arg(long = "place", value_name = "UNIT@TILE", value_parser = parse_placement)]
    placements: Vec<FormationPlacement>,
    /// Share string produced by `export`, placed before any `--place`.
    #[arg(long)]
    import: Option<String>,
}

/// Entry point for the formation command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = load_catalog(cli.catalog.as_deref())?;

    match cli.mode {
        Mode::Preview(args) => {
            let session = build_session(&catalog, &args)?;
            print!("{}", report::render_preview(&session, &catalog));
        }
        Mode::Deploy(args) => {
            let mut session = build_session(&catalog, &args)?;
            print!("{}", report::render_preview(&session, &catalog));
            let mut instantiator = LoggingInstantiator::default();
            let mut sink = LoggingSink;
            let deployment = session
                .deploy(&mut instantiator, &mut sink)
                .context("deployment rejected")?;
            print!("{}", report::render_deployment(&deployment));
        }
        Mode::Export(args) => {
            let session = build_session(&catalog, &args)?;
            let snapshot = snapshot_of(&session)?;
            println!("{}", snapshot.encode()?);
        }
    }

    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("failed to load catalog {}", path.display())),
        None => Catalog::builtin().context("builtin catalog is invalid"),
    }
}

fn build_session(catalog: &Catalog, args: &FormationArgs) -> Result<Session> {
    let imported = args
        .import
        .as_deref()
        .map(FormationSnapshot::decode)
        .transpose()
        .context("could not import formation")?;

    let stage_type = match (args.stage, &imported) {
        (Some(stage), _) => StageType::new(stage),
        (None, Some(snapshot)) => snapshot.stage_type,
        (None, None) => bail!("pass --stage or --import to choose a stage"),
    };

    let mut session = Session::new(catalog);
    let _ = session.submit(Command::LoadStage {
        stage: stage_config(catalog, stage_type, args),
    });

    let placements = imported
        .iter()
        .flat_map(|snapshot| snapshot.placements.iter())
        .chain(args.placements.iter());
    for placement in placements {
        let events = session.submit(Command::PlaceUnit {
            unit: placement.unit,
            tile: placement.tile,
        });
        for event in events {
            if let Event::PlacementRejected { reason, .. } = event {
                tracing::warn!(
                    unit = placement.unit.get(),
                    tile = placement.tile.get(),
                    %reason,
                    "placement.skipped"
                );
            }
        }
    }

    Ok(session)
}

fn stage_config(catalog: &Catalog, stage_type: StageType, args: &FormationArgs) -> StageConfig {
    let mut stage = catalog.stage(stage_type).map_or_else(
        || {
            tracing::info!(stage_type = stage_type.get(), "stage.not_in_catalog");
            StageConfig::new(stage_type, DEFAULT_MEMBER_COUNT)
        },
        |entry| entry.config,
    );
    if let Some(members) = args.members {
        stage.member_count = members;
    }
    if let Some(max_deploy) = args.max_deploy {
        stage = stage.with_max_deploy(max_deploy);
    }
    stage
}

fn snapshot_of(session: &Session) -> Result<FormationSnapshot> {
    let stage = session.stage().context("no stage loaded")?;
    Ok(FormationSnapshot {
        stage_type: stage.stage_type,
        placements: session
            .placements()
            .iter()
            .map(|(tile, placed)| FormationPlacement {
                unit: placed.unit,
                tile,
            })
            .collect(),
    })
}

fn parse_placement(value: &str) -> Result<FormationPlacement, String> {
    let (unit, tile) = value
        .split_once('@')
        .ok_or_else(|| format!("expected <unit>@<tile>, found `{value}`"))?;
    let unit = unit
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid unit `{unit}`: {error}"))?;
    let tile = tile
        .trim()
        .parse::<u8>()
        .map_err(|error| format!("invalid tile `{tile}`: {error}"))?;
    let tile =
        TileIndex::try_new(tile).ok_or_else(|| format!("tile {tile} is outside the grid"))?;

    Ok(FormationPlacement {
        unit: UnitId::new(unit),
        tile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn placements_parse_unit_and_tile() {
        let placement = parse_placement("1003@12").expect("placement parses");
        assert_eq!(placement.unit, UnitId::new(1003));
        assert_eq!(placement.tile, TileIndex::new(12));
    }

    #[test]
    fn placements_outside_the_grid_are_rejected() {
        assert_eq!(
            parse_placement("1003@15").expect_err("tile rejected"),
            "tile 15 is outside the grid"
        );
        assert!(parse_placement("1003").is_err());
    }

    #[test]
    fn command_line_overrides_stage_cap() {
        let catalog = Catalog::builtin().expect("builtin catalog parses");
        let cli = Cli::try_parse_from([
            "formation",
            "deploy",
            "--stage",
            "3",
            "--max-deploy",
            "2",
            "--place",
            "1001@0",
        ])
        .expect("arguments parse");
        let Mode::Deploy(args) = cli.mode else {
            panic!("expected deploy mode");
        };

        let stage = stage_config(&catalog, StageType::new(3), &args);
        assert_eq!(stage.member_count, 4);
        assert_eq!(stage.max_deploy(), 2);
    }

    #[test]
    fn unknown_stages_use_the_default_squad() {
        let catalog = Catalog::builtin().expect("builtin catalog parses");
        let cli = Cli::try_parse_from(["formation", "preview", "--stage", "77"])
            .expect("arguments parse");
        let Mode::Preview(args) = cli.mode else {
            panic!("expected preview mode");
        };

        let session = build_session(&catalog, &args).expect("session builds");
        let stage = session.stage().expect("stage loaded");
        assert_eq!(stage.max_deploy(), DEFAULT_MEMBER_COUNT);
        assert_eq!(session.mask().enabled_count(), 15);
    }

    #[test]
    fn exported_formations_import_unchanged() {
        let catalog = Catalog::builtin().expect("builtin catalog parses");
        let cli = Cli::try_parse_from([
            "formation", "export", "--stage", "2", "--place", "1001@1", "--place", "1002@8",
        ])
        .expect("arguments parse");
        let Mode::Export(args) = cli.mode else {
            panic!("expected export mode");
        };
        let exported = snapshot_of(&build_session(&catalog, &args).expect("session builds"))
            .expect("snapshot")
            .encode()
            .expect("encodes");

        let cli = Cli::try_parse_from(["formation", "preview", "--import", exported.as_str()])
            .expect("arguments parse");
        let Mode::Preview(args) = cli.mode else {
            panic!("expected preview mode");
        };
        let session = build_session(&catalog, &args).expect("session builds");

        assert_eq!(
            session.stage().map(|stage| stage.stage_type),
            Some(StageType::new(2))
        );
        assert_eq!(session.placements().tile_of(UnitId::new(1002)), Some(TileIndex::new(8)));
        assert_eq!(session.placements().len(), 2);
    }
}
