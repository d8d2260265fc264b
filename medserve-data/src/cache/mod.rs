//! Client-side synchronization layer
//!
//! One [`SyncHandle`] per entity family owns every cached query for that
//! family: the overview list, per-id lookups, filtered/paginated lists and
//! the statistics view. Reads are served from cache within the staleness
//! window and deduplicated across concurrent observers; confirmed
//! mutations patch the cached views in place and publish a change event,
//! so dashboard surfaces converge without refetching.
//!
//! Cache patches are strictly best-effort. The remote write has already
//! succeeded by the time a patch runs, so a patch failure is logged and
//! the affected view invalidated, never surfaced to the caller.

mod slot;

pub use slot::QuerySlot;

use crate::config::SyncConfig;
use crate::error::{AccessResult, CachePatchError};
use crate::resources::{ChildWriteStatus, Created, Resource, ResourceAccess, StatusPatch};
use crate::retry::with_retries;
use dashmap::DashMap;
use shared::ListOptions;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Confirmed mutation, published to subscribers after the cache has been
/// patched.
#[derive(Debug, Clone)]
pub enum ChangeEvent<E> {
    Created(E),
    Updated(E),
    Deleted(Uuid),
}

/// Cached access to one entity family.
pub struct SyncHandle<E: Resource, A: ResourceAccess<E>> {
    access: A,
    config: SyncConfig,
    overview: QuerySlot<Vec<E>>,
    stats: QuerySlot<E::Stats>,
    by_id: DashMap<Uuid, Arc<QuerySlot<E>>>,
    filtered: DashMap<String, Arc<QuerySlot<Vec<E>>>>,
    events: broadcast::Sender<ChangeEvent<E>>,
}

impl<E: Resource, A: ResourceAccess<E>> SyncHandle<E, A> {
    pub fn new(access: A) -> Self {
        Self::with_config(access, SyncConfig::default())
    }

    pub fn with_config(access: A, config: SyncConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            access,
            config,
            overview: QuerySlot::new(),
            stats: QuerySlot::new(),
            by_id: DashMap::new(),
            filtered: DashMap::new(),
            events,
        }
    }

    /// Subscribe to confirmed mutations on this family. Slow subscribers
    /// that fall behind the channel capacity see a lag error and should
    /// refetch.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent<E>> {
        self.events.subscribe()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn list(&self, options: &ListOptions) -> AccessResult<Vec<E>> {
        if options.is_overview() {
            // Fetch with the same page size the optimistic create patch
            // trims to, so the cached overview keeps one length across
            // refetches and patches
            let fetch = options.clone().paginate(1, self.config.overview_page_size);
            return self
                .overview
                .get_or_fetch(self.config.staleness, || async {
                    with_retries(self.config.read_retries, || self.access.list(&fetch)).await
                })
                .await;
        }
        let slot = self.filtered_slot(options);
        slot.get_or_fetch(self.config.staleness, || async {
            with_retries(self.config.read_retries, || self.access.list(options)).await
        })
        .await
    }

    pub async fn get(&self, id: Uuid) -> AccessResult<E> {
        let slot = self.entity_slot(id);
        slot.get_or_fetch(self.config.staleness, || async {
            with_retries(self.config.read_retries, || self.access.get(id)).await
        })
        .await
    }

    pub async fn statistics(&self) -> AccessResult<E::Stats> {
        self.stats
            .get_or_fetch(self.config.staleness, || async {
                with_retries(self.config.read_retries, || self.access.statistics()).await
            })
            .await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn create(&self, draft: E::Draft) -> AccessResult<Created<E>> {
        let created = self.access.create(draft).await?;
        if let ChildWriteStatus::Failed(reason) = &created.child_write {
            tracing::warn!(
                family = E::FAMILY,
                id = %created.entity.id(),
                reason,
                "entity created without its child rows"
            );
        }
        self.apply_created(&created.entity).await;
        self.publish(ChangeEvent::Created(created.entity.clone()));
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, draft: E::Draft) -> AccessResult<E> {
        let entity = self.access.update(id, draft).await?;
        self.apply_updated(&entity).await;
        self.publish(ChangeEvent::Updated(entity.clone()));
        Ok(entity)
    }

    pub async fn set_flag(&self, id: Uuid, patch: StatusPatch) -> AccessResult<E> {
        let entity = self.access.set_flag(id, patch).await?;
        self.apply_updated(&entity).await;
        self.publish(ChangeEvent::Updated(entity.clone()));
        Ok(entity)
    }

    pub async fn delete(&self, id: Uuid) -> AccessResult<()> {
        // Snapshot the entity before deleting so statistics can be
        // unfolded afterwards; cheapest source first
        let snapshot = self.cached_entity(id).await;
        self.access.delete(id).await?;
        self.apply_deleted(id, snapshot.as_ref()).await;
        self.publish(ChangeEvent::Deleted(id));
        Ok(())
    }

    /// Drop every cached view, e.g. on sign-out or environment switch.
    /// Event subscriptions survive.
    pub async fn reset(&self) {
        self.overview.invalidate().await;
        self.stats.invalidate().await;
        self.by_id.clear();
        self.filtered.clear();
    }

    // =========================================================================
    // Cache maintenance
    // =========================================================================

    fn entity_slot(&self, id: Uuid) -> Arc<QuerySlot<E>> {
        self.by_id
            .entry(id)
            .or_insert_with(|| Arc::new(QuerySlot::new()))
            .clone()
    }

    fn filtered_slot(&self, options: &ListOptions) -> Arc<QuerySlot<Vec<E>>> {
        self.filtered
            .entry(options.cache_key())
            .or_insert_with(|| Arc::new(QuerySlot::new()))
            .clone()
    }

    async fn cached_entity(&self, id: Uuid) -> Option<E> {
        if let Some(slot) = self.by_id.get(&id).map(|s| Arc::clone(s.value())) {
            if let Some(entity) = slot.peek().await {
                return Some(entity);
            }
        }
        if let Some(list) = self.overview.peek().await {
            if let Some(entity) = list.into_iter().find(|e| e.id() == id) {
                return Some(entity);
            }
        }
        self.access.get(id).await.ok()
    }

    async fn apply_created(&self, entity: &E) {
        let page = self.config.overview_page_size as usize;
        let result = self
            .overview
            .patch(|list| {
                list.retain(|e| e.id() != entity.id());
                list.insert(0, entity.clone());
                list.truncate(page);
                Ok(())
            })
            .await;
        self.log_patch("overview", result);

        let result = self
            .stats
            .patch(|stats| {
                E::fold_stats(stats, entity);
                Ok(())
            })
            .await;
        self.log_patch("stats", result);

        self.entity_slot(entity.id()).put(entity.clone()).await;
        // Filtered views cannot be patched without re-evaluating their
        // predicates; drop them wholesale
        self.filtered.clear();
    }

    async fn apply_updated(&self, entity: &E) {
        let result = self
            .overview
            .patch(|list| {
                if let Some(cached) = list.iter_mut().find(|e| e.id() == entity.id()) {
                    *cached = entity.clone();
                }
                Ok(())
            })
            .await;
        self.log_patch("overview", result);

        // An update can shift aggregates in ways a fold/unfold pair cannot
        // express without the previous entity, so the stats view refetches
        self.stats.invalidate().await;

        self.entity_slot(entity.id()).put(entity.clone()).await;
        self.filtered.clear();
    }

    async fn apply_deleted(&self, id: Uuid, snapshot: Option<&E>) {
        let result = self
            .overview
            .patch(|list| {
                list.retain(|e| e.id() != id);
                Ok(())
            })
            .await;
        self.log_patch("overview", result);

        match snapshot {
            Some(entity) => {
                let result = self
                    .stats
                    .patch(|stats| {
                        E::unfold_stats(stats, entity);
                        Ok(())
                    })
                    .await;
                self.log_patch("stats", result);
            }
            // Without a snapshot there is nothing to unfold
            None => self.stats.invalidate().await,
        }

        self.by_id.remove(&id);
        self.filtered.clear();
    }

    fn log_patch(&self, view: &str, result: Result<(), CachePatchError>) {
        if let Err(e) = result {
            tracing::warn!(family = E::FAMILY, view, error = %e, "cache patch dropped, view invalidated");
        }
    }

    fn publish(&self, event: ChangeEvent<E>) {
        // Send only fails when no subscriber exists, which is fine
        let _ = self.events.send(event);
    }
}
