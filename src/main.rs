use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use futures::executor::block_on;
use rootcause::prelude::*;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use weaponview::config::ViewerConfig;
use weaponview::data::{AssetCache, VfsSource};
use weaponview::models::target::select_target_mesh;
use weaponview::stickers::{ProfileRegistry, SlotCoefficient, StickerPlacement, WeaponFamily};
use weaponview::texture::skin::SkinOutcome;
use weaponview::weapon::{ModelVariant, StickerAssignment, WeaponId};
use weaponview::{Frame, ViewerProps, WeaponViewer};

/// Compose weapon previews from a directory of models and textures
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON file overriding the default viewer configuration
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a weapon, apply its skin and stickers, and print what would be rendered
    Inspect {
        /// Asset root containing `models/` and `textures/`
        #[clap(short, long)]
        root: PathBuf,

        #[clap(short, long)]
        weapon: String,

        #[clap(short, long)]
        paint: Option<String>,

        /// Show the legacy render instead of the current one
        #[clap(long)]
        legacy: bool,

        /// Sticker image per slot, in slot order. Pass "" to leave a slot empty.
        #[clap(short, long = "sticker")]
        stickers: Vec<String>,
    },
    /// Print sticker slot coefficients
    Profiles {
        /// Only show this weapon's resolved profile
        #[clap(short, long)]
        weapon: Option<String>,
    },
}

#[derive(Serialize)]
struct MaterialSummary {
    name: String,
    skinned: bool,
    metalness_map: bool,
    metalness: f32,
    revision: u32,
}

#[derive(Serialize)]
struct InspectSummary {
    weapon: WeaponId,
    variant: ModelVariant,
    scale_factor: f32,
    size: [f32; 3],
    half_depth: f32,
    skin: SkinOutcome,
    target_mesh: Option<String>,
    materials: Vec<MaterialSummary>,
    placements: Vec<StickerPlacement>,
    loaded_decals: Vec<usize>,
}

#[derive(Serialize)]
struct Unavailable {
    weapon: WeaponId,
    message: String,
    reason: String,
}

#[derive(Serialize)]
struct ProfileSummary<'a> {
    weapon: &'a WeaponId,
    family: Option<WeaponFamily>,
    slots: &'a [SlotCoefficient],
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Report> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn inspect(
    config: ViewerConfig,
    root: PathBuf,
    weapon: String,
    paint: Option<String>,
    legacy: bool,
    stickers: Vec<String>,
) -> Result<(), Report> {
    if !root.is_dir() {
        bail!("Asset root is not a directory: {}", root.display());
    }

    let source = Rc::new(VfsSource::physical(&root));
    let cache = Rc::new(AssetCache::new(source, config.paths.clone()));
    let config = Rc::new(config);
    let viewer = WeaponViewer::new(cache, Rc::clone(&config));

    let props = ViewerProps::builder()
        .weapon(weapon)
        .maybe_paint(paint)
        .legacy_model(legacy)
        .stickers(StickerAssignment::from_refs(stickers.into_iter().map(Some)))
        .build();
    let variant = props.variant();

    info!("composing {}", props.weapon);
    block_on(viewer.update(props).run());

    match viewer.frame() {
        Frame::Ready(scene) => {
            let model = &scene.model;
            let summary = InspectSummary {
                target_mesh: select_target_mesh(&model.root, &config)
                    .map(|mesh| mesh.material.name.clone()),
                materials: model
                    .root
                    .all_meshes()
                    .into_iter()
                    .map(|mesh| MaterialSummary {
                        name: mesh.material.name.clone(),
                        skinned: mesh.material.map.is_some(),
                        metalness_map: mesh.material.metalness_map.is_some(),
                        metalness: mesh.material.metalness,
                        revision: mesh.material.revision,
                    })
                    .collect(),
                placements: viewer.placements(),
                loaded_decals: scene
                    .decals
                    .iter()
                    .filter(|decal| decal.is_loaded())
                    .map(|decal| decal.slot)
                    .collect(),
                weapon: scene.weapon,
                variant,
                scale_factor: scene.group_scale,
                size: model.size.to_array(),
                half_depth: model.half_depth,
                skin: scene.skin,
            };
            print_json(&summary)
        }
        Frame::Unavailable { message, reason } => print_json(&Unavailable {
            weapon: viewer.props().weapon,
            message,
            reason,
        }),
        Frame::Empty | Frame::Loading => bail!("No weapon was composed"),
    }
}

fn profiles(weapon: Option<String>) -> Result<(), Report> {
    let registry = ProfileRegistry::default();
    match weapon {
        Some(weapon) => {
            let weapon = WeaponId::new(weapon);
            print_json(&ProfileSummary {
                family: registry.family_of(&weapon),
                slots: registry.lookup(&weapon),
                weapon: &weapon,
            })
        }
        None => {
            let listing: Vec<ProfileSummary<'_>> = registry
                .weapons()
                .into_iter()
                .map(|(weapon, family)| ProfileSummary {
                    weapon,
                    family: Some(family),
                    slots: registry.lookup(weapon),
                })
                .collect();
            print_json(&listing)
        }
    }
}

fn main() -> Result<(), Report> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path).context("Failed to load viewer config")?,
        None => ViewerConfig::default(),
    };

    match args.command {
        Command::Inspect {
            root,
            weapon,
            paint,
            legacy,
            stickers,
        } => inspect(config, root, weapon, paint, legacy, stickers),
        Command::Profiles { weapon } => profiles(weapon),
    }
}
