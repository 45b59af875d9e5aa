//! Process-wide, read-through cache of parsed weapon models.
//!
//! One entry per weapon id. Concurrent requests for the same id share a
//! single fetch-and-parse; successful entries live for the lifetime of the
//! cache. Failed entries are evicted so a later request can retry.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use tracing::{debug, warn};

use super::AssetSource;
use crate::config::AssetPaths;
use crate::error::ViewError;
use crate::models::WeaponAsset;
use crate::weapon::WeaponId;

pub type AssetResult = Result<Rc<WeaponAsset>, ViewError>;
type PendingAsset = Shared<LocalBoxFuture<'static, AssetResult>>;

pub struct AssetCache<S> {
    source: Rc<S>,
    paths: AssetPaths,
    entries: Rc<RefCell<HashMap<WeaponId, PendingAsset>>>,
}

impl<S: AssetSource + 'static> AssetCache<S> {
    pub fn new(source: Rc<S>, paths: AssetPaths) -> Self {
        Self {
            source,
            paths,
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn source(&self) -> &Rc<S> {
        &self.source
    }

    pub fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    /// Number of weapons with a pending or completed entry.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Resolve the master copy of `weapon`, fetching it at most once.
    ///
    /// The returned future does not borrow the cache.
    pub fn load(&self, weapon: &WeaponId) -> impl Future<Output = AssetResult> + 'static {
        let pending = self.entry(weapon);
        let entries = Rc::clone(&self.entries);
        let weapon = weapon.clone();
        async move {
            let result = pending.clone().await;
            if let Err(err) = &result {
                let mut entries = entries.borrow_mut();
                if let Some(current) = entries.get(&weapon)
                    && current.ptr_eq(&pending)
                {
                    warn!(weapon = %weapon, "evicting failed model entry: {err}");
                    entries.remove(&weapon);
                }
            }
            result
        }
    }

    fn entry(&self, weapon: &WeaponId) -> PendingAsset {
        if let Some(existing) = self.entries.borrow().get(weapon) {
            debug!(weapon = %weapon, "model cache hit");
            return existing.clone();
        }

        debug!(weapon = %weapon, "model cache miss");
        let source = Rc::clone(&self.source);
        let path = self.paths.model(weapon);
        let id = weapon.clone();
        let pending = async move {
            let bytes = source
                .fetch(&path)
                .await
                .map_err(|e| ViewError::asset_unavailable(id.as_str(), e))?;
            let asset = WeaponAsset::from_gltf_bytes(id.clone(), &bytes)
                .map_err(|e| ViewError::asset_unavailable(id.as_str(), e))?;
            Ok(Rc::new(asset))
        }
        .boxed_local()
        .shared();

        self.entries
            .borrow_mut()
            .insert(weapon.clone(), pending.clone());
        pending
    }
}
