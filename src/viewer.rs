//! One interactive preview: model, skin and stickers for a single weapon.
//!
//! A [`WeaponViewer`] is driven by [`WeaponViewer::update`] with the latest
//! [`ViewerProps`]. Updates are synchronous; any I/O they need comes back as
//! [`ViewerTasks`] for the host to run on its local executor. Completed work
//! only lands if its liveness token is still current, so the state observed
//! through [`WeaponViewer::frame`] always belongs to the latest props.

use std::cell::RefCell;
use std::rc::Rc;

use bon::Builder;
use futures::future::{FutureExt, LocalBoxFuture, join_all};
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};
use tracing::{debug, info, warn};

use crate::config::{CameraSettings, ViewerConfig};
use crate::data::{AssetCache, AssetSource, cache::AssetResult};
use crate::error::ViewError;
use crate::liveness::{LoadSlot, ResourceClass};
use crate::models::{NormalizedModel, WeaponAsset, normalize};
use crate::stickers::decal::{DecalLoad, load_decal_texture};
use crate::stickers::{DecalSet, ProfileRegistry, StickerDecal, StickerPlacement, compute_placements};
use crate::texture::skin::{SkinOutcome, apply_skin_maps, load_skin_maps};
use crate::weapon::{CatalogEntry, ModelVariant, PaintId, StickerAssignment, WeaponId};

/// Everything the caller controls about a viewer.
#[derive(Builder, Debug, Clone, Default, PartialEq)]
pub struct ViewerProps {
    /// An empty id renders nothing.
    #[builder(into)]
    pub weapon: WeaponId,
    #[builder(into)]
    pub paint: Option<PaintId>,
    #[builder(default)]
    pub stickers: StickerAssignment,
    #[builder(default)]
    pub legacy_model: bool,
}

impl ViewerProps {
    pub fn from_catalog(entry: &CatalogEntry, stickers: StickerAssignment) -> Self {
        Self {
            weapon: entry.weapon_id.clone(),
            paint: entry.paint_id.clone(),
            stickers,
            legacy_model: entry.legacy_model.unwrap_or(false),
        }
    }

    pub fn variant(&self) -> ModelVariant {
        ModelVariant::from_legacy_flag(self.legacy_model)
    }
}

pub type ViewerTask = LocalBoxFuture<'static, ()>;

/// Asynchronous work started by an update.
#[must_use = "viewer tasks do nothing unless they are run"]
#[derive(Default)]
pub struct ViewerTasks(Vec<ViewerTask>);

impl ViewerTasks {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Spawn every task on a local executor.
    pub fn spawn_on<Sp: LocalSpawn>(self, spawner: &Sp) -> Result<(), SpawnError> {
        for task in self.0 {
            spawner.spawn_local(task)?;
        }
        Ok(())
    }

    /// Run every task to completion, concurrently.
    pub async fn run(self) {
        join_all(self.0).await;
    }
}

impl IntoIterator for ViewerTasks {
    type Item = ViewerTask;
    type IntoIter = std::vec::IntoIter<ViewerTask>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A renderable snapshot of a ready viewer.
#[derive(Debug, Clone)]
pub struct SceneFrame {
    pub weapon: WeaponId,
    /// Uniform scale of the group holding the model and its decals.
    pub group_scale: f32,
    pub model: NormalizedModel,
    pub skin: SkinOutcome,
    pub decals: Vec<StickerDecal>,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone)]
pub enum Frame {
    /// No weapon selected.
    Empty,
    Loading,
    /// The model could not be loaded; show `message` instead of a 3D view.
    Unavailable { message: String, reason: String },
    Ready(SceneFrame),
}

impl Frame {
    pub fn is_ready(&self) -> bool {
        matches!(self, Frame::Ready(_))
    }
}

#[derive(Debug)]
enum Phase {
    Empty,
    Loading,
    Unavailable(ViewError),
    Ready {
        asset: Rc<WeaponAsset>,
        model: NormalizedModel,
        /// A skin has been applied since the model was last derived.
        skinned: bool,
    },
}

struct State {
    props: ViewerProps,
    phase: Phase,
    skin: SkinOutcome,
    decals: DecalSet,
}

struct Inner<S> {
    cache: Rc<AssetCache<S>>,
    config: Rc<ViewerConfig>,
    profiles: Rc<ProfileRegistry>,
    model_load: LoadSlot,
    skin_load: LoadSlot,
    state: RefCell<State>,
}

pub struct WeaponViewer<S> {
    inner: Rc<Inner<S>>,
}

impl<S: AssetSource + 'static> WeaponViewer<S> {
    pub fn new(cache: Rc<AssetCache<S>>, config: Rc<ViewerConfig>) -> Self {
        Self::with_profiles(cache, config, Rc::new(ProfileRegistry::default()))
    }

    pub fn with_profiles(
        cache: Rc<AssetCache<S>>,
        config: Rc<ViewerConfig>,
        profiles: Rc<ProfileRegistry>,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                cache,
                config,
                profiles,
                model_load: LoadSlot::new(ResourceClass::Model),
                skin_load: LoadSlot::new(ResourceClass::Skin),
                state: RefCell::new(State {
                    props: ViewerProps::default(),
                    phase: Phase::Empty,
                    skin: SkinOutcome::Skipped,
                    decals: DecalSet::new(),
                }),
            }),
        }
    }

    pub fn props(&self) -> ViewerProps {
        self.inner.state.borrow().props.clone()
    }

    /// Apply new props and return the loads they require.
    ///
    /// On a paint change the previous skin stays on screen until the new
    /// maps resolve; the model is then re-derived and skinned in one step.
    pub fn update(&self, props: ViewerProps) -> ViewerTasks {
        let this = &self.inner;
        let mut state = this.state.borrow_mut();
        let state = &mut *state;
        let previous = std::mem::replace(&mut state.props, props);
        let props = &state.props;

        if props.weapon.is_empty() {
            this.model_load.invalidate();
            this.skin_load.invalidate();
            state.decals.reconcile(&[]);
            state.phase = Phase::Empty;
            state.skin = SkinOutcome::Skipped;
            return ViewerTasks::default();
        }

        let model_changed = matches!(state.phase, Phase::Empty)
            || previous.weapon != props.weapon
            || previous.legacy_model != props.legacy_model;

        let mut tasks = Vec::new();
        if model_changed {
            this.skin_load.invalidate();
            state.decals.reconcile(&[]);
            state.phase = Phase::Loading;
            state.skin = SkinOutcome::Skipped;
            tasks.push(Inner::start_model(this, state));
        } else if previous.paint != props.paint {
            tasks.extend(Inner::start_skin(this, state));
            tasks.extend(Inner::refresh_decals(this, state));
        } else if previous.stickers != props.stickers {
            tasks.extend(Inner::refresh_decals(this, state));
        }
        ViewerTasks(tasks)
    }

    /// Snapshot of what should currently be on screen.
    pub fn frame(&self) -> Frame {
        let state = self.inner.state.borrow();
        match &state.phase {
            Phase::Empty => Frame::Empty,
            Phase::Loading => Frame::Loading,
            Phase::Unavailable(err) => Frame::Unavailable {
                message: self.inner.config.fallback_message.clone(),
                reason: err.to_string(),
            },
            Phase::Ready { model, .. } => Frame::Ready(SceneFrame {
                weapon: state.props.weapon.clone(),
                group_scale: model.scale_factor,
                model: model.clone(),
                skin: state.skin,
                decals: state.decals.iter().cloned().collect(),
                camera: self.inner.config.camera,
            }),
        }
    }

    pub fn skin(&self) -> SkinOutcome {
        self.inner.state.borrow().skin
    }

    /// Placements for the current model and stickers; empty until ready.
    pub fn placements(&self) -> Vec<StickerPlacement> {
        let state = self.inner.state.borrow();
        match &state.phase {
            Phase::Ready { model, .. } => Inner::placements(&self.inner, &state, model),
            _ => Vec::new(),
        }
    }
}

impl<S> Drop for WeaponViewer<S> {
    fn drop(&mut self) {
        self.inner.model_load.invalidate();
        self.inner.skin_load.invalidate();
        self.inner.state.borrow().decals.invalidate_all();
    }
}

impl<S: AssetSource + 'static> Inner<S> {
    fn start_model(this: &Rc<Self>, state: &State) -> ViewerTask {
        let token = this.model_load.begin();
        let weapon = state.props.weapon.clone();
        let load = this.cache.load(&weapon);
        let weak = Rc::downgrade(this);
        debug!(%weapon, variant = ?state.props.variant(), "loading model");

        async move {
            let result = load.await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !token.is_live() {
                debug!(%weapon, "discarding stale model");
                return;
            }
            let follow_up = Self::model_loaded(&inner, result);
            drop(inner);
            join_all(follow_up).await;
        }
        .boxed_local()
    }

    fn model_loaded(this: &Rc<Self>, result: AssetResult) -> Vec<ViewerTask> {
        let mut state = this.state.borrow_mut();
        match result {
            Ok(asset) => {
                let model = normalize(&asset, state.props.variant(), &this.config);
                state.phase = Phase::Ready {
                    asset,
                    model,
                    skinned: false,
                };
                let mut tasks: Vec<_> = Self::start_skin(this, &mut state).into_iter().collect();
                tasks.extend(Self::refresh_decals(this, &mut state));
                tasks
            }
            Err(err) if err.is_silent() => {
                debug!(weapon = %state.props.weapon, "model result dropped: {err}");
                Vec::new()
            }
            Err(err) => {
                info!(weapon = %state.props.weapon, "showing fallback: {err}");
                state.phase = Phase::Unavailable(err);
                Vec::new()
            }
        }
    }

    /// Replace a skinned working copy with a fresh one from the master asset.
    fn reset_model(this: &Rc<Self>, state: &mut State) {
        let variant = state.props.variant();
        if let Phase::Ready {
            asset,
            model,
            skinned,
        } = &mut state.phase
            && *skinned
        {
            *model = normalize(asset, variant, &this.config);
            *skinned = false;
        }
    }

    fn start_skin(this: &Rc<Self>, state: &mut State) -> Option<ViewerTask> {
        let token = this.skin_load.begin();
        if !matches!(state.phase, Phase::Ready { .. }) {
            return None;
        }
        let Some(paint) = state.props.paint.clone() else {
            Self::reset_model(this, state);
            state.skin = SkinOutcome::Skipped;
            return None;
        };
        state.skin = SkinOutcome::Pending;

        let weapon = state.props.weapon.clone();
        let source = Rc::clone(this.cache.source());
        let config = Rc::clone(&this.config);
        let weak = Rc::downgrade(this);

        Some(
            async move {
                let result = load_skin_maps(&*source, &config.paths, &weapon, &paint, &token).await;
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if !token.is_live() {
                    debug!(%weapon, %paint, "discarding stale skin");
                    return;
                }

                let mut state = inner.state.borrow_mut();
                let state = &mut *state;
                Self::reset_model(&inner, state);
                match result {
                    Ok(maps) => {
                        if let Phase::Ready { model, skinned, .. } = &mut state.phase {
                            let surfaces = apply_skin_maps(&mut model.root, &maps, &config);
                            *skinned = true;
                            debug!(%weapon, %paint, surfaces, "skin applied");
                            state.skin = SkinOutcome::Applied {
                                metalness: maps.metal.is_some(),
                            };
                        }
                    }
                    Err(err) => {
                        warn!(%weapon, %paint, "skin not applied: {err}");
                        state.skin = SkinOutcome::from_error(&err);
                    }
                }
            }
            .boxed_local(),
        )
    }

    fn placements(this: &Rc<Self>, state: &State, model: &NormalizedModel) -> Vec<StickerPlacement> {
        compute_placements(
            model,
            &state.props.stickers,
            &state.props.weapon,
            &this.profiles,
            &this.config.stickers,
        )
    }

    fn refresh_decals(this: &Rc<Self>, state: &mut State) -> Vec<ViewerTask> {
        let Phase::Ready { model, .. } = &state.phase else {
            return Vec::new();
        };
        let placements = Self::placements(this, state, model);
        state
            .decals
            .reconcile(&placements)
            .into_iter()
            .map(|load| Self::start_decal(this, load))
            .collect()
    }

    fn start_decal(this: &Rc<Self>, load: DecalLoad) -> ViewerTask {
        let source = Rc::clone(this.cache.source());
        let config = Rc::clone(&this.config);
        let weak = Rc::downgrade(this);

        async move {
            let result =
                load_decal_texture(&*source, &load.image_ref, &config.sticker_proxy, &load.token).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Err(ViewError::StaleResult { resource }) = &result {
                debug!(%resource, image = %load.image_ref, "discarding stale sticker image");
                return;
            }
            inner.state.borrow_mut().decals.finish_load(&load, result);
        }
        .boxed_local()
    }
}
