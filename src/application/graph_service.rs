// Graph service - Orchestrates log merges and cached renders for one page
use crate::application::log_merge::LogMerger;
use crate::application::render_cache::{CacheOutcome, RenderCache};
use crate::application::sensor_config::SensorConfigRepository;
use crate::domain::cache_key::{CacheKey, ImageRef};
use crate::domain::chart::{Category, ChartMode, SeriesDescriptor};
use crate::domain::page::GraphPage;
use crate::domain::session::SessionPreferences;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct GraphService {
    sensors: Arc<dyn SensorConfigRepository>,
    merger: Arc<dyn LogMerger>,
    cache: Arc<RenderCache>,
}

impl GraphService {
    pub fn new(
        sensors: Arc<dyn SensorConfigRepository>,
        merger: Arc<dyn LogMerger>,
        cache: Arc<RenderCache>,
    ) -> Self {
        Self {
            sensors,
            merger,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<RenderCache> {
        &self.cache
    }

    pub async fn render(&self, prefs: &SessionPreferences) -> GraphPage {
        let started_at = Instant::now();
        let series = self.enabled_series().await;
        let mut page = GraphPage::default();

        match prefs.mode {
            ChartMode::Combined => self.render_combined(prefs, &series, &mut page).await,
            ChartMode::Default | ChartMode::Separate => {
                self.render_per_series(prefs, &series, &mut page).await
            }
        }

        tracing::info!(
            op = "graph_service::render",
            group_id = %prefs.group_id,
            mode = %prefs.mode,
            span = %prefs.span,
            images = page.images().count(),
            hits = page.stats.hits,
            rendered = page.stats.rendered,
            failed = page.stats.failed,
            backed_off = page.stats.backed_off,
            skipped_categories = page.stats.skipped_categories,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Graph page prepared"
        );
        page
    }

    /// Enabled series per category, in traversal order. A category whose
    /// configuration cannot be read counts as having nothing enabled.
    async fn enabled_series(&self) -> Vec<(Category, Vec<SeriesDescriptor>)> {
        let mut series = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let flags = match self.sensors.graph_flags(category).await {
                Ok(flags) => flags,
                Err(err) => {
                    tracing::warn!(
                        op = "graph_service::enabled_series",
                        %category,
                        error = %err,
                        "Sensor configuration unreadable; treating category as disabled"
                    );
                    Vec::new()
                }
            };
            let enabled = SeriesDescriptor::from_flags(category, &flags)
                .into_iter()
                .filter(|s| s.enabled)
                .collect();
            series.push((category, enabled));
        }
        series
    }

    async fn render_per_series(
        &self,
        prefs: &SessionPreferences,
        series: &[(Category, Vec<SeriesDescriptor>)],
        page: &mut GraphPage,
    ) {
        for (category, enabled) in series {
            if enabled.is_empty() {
                continue;
            }

            let merged = match self.merger.merge(*category).await {
                Ok(merged) => merged,
                Err(err) => {
                    tracing::warn!(
                        op = "graph_service::render",
                        %category,
                        error = %err,
                        "Log merge failed; skipping category"
                    );
                    page.stats.skipped_categories += 1;
                    continue;
                }
            };

            for descriptor in enabled {
                let key = match prefs.mode {
                    ChartMode::Separate => CacheKey::separate_series(
                        descriptor.category,
                        prefs.span,
                        prefs.group_id.clone(),
                        descriptor.index,
                    ),
                    _ => CacheKey::default_series(
                        descriptor.category,
                        prefs.group_id.clone(),
                        descriptor.index,
                    ),
                };
                let ensured = self.cache.ensure(&key, Some(merged.path())).await;
                record(page, &key, ensured.outcome);
            }

            self.merger.release(merged).await;
        }
    }

    async fn render_combined(
        &self,
        prefs: &SessionPreferences,
        series: &[(Category, Vec<SeriesDescriptor>)],
        page: &mut GraphPage,
    ) {
        if series.iter().all(|(_, enabled)| enabled.is_empty()) {
            return;
        }
        let key = CacheKey::combined(prefs.span, prefs.group_id.clone());
        let ensured = self.cache.ensure(&key, None).await;
        record(page, &key, ensured.outcome);
    }
}

fn record(page: &mut GraphPage, key: &CacheKey, outcome: CacheOutcome) {
    match outcome {
        CacheOutcome::Hit => page.stats.hits += 1,
        CacheOutcome::Rendered => page.stats.rendered += 1,
        CacheOutcome::Failed => page.stats.failed += 1,
        CacheOutcome::BackedOff => page.stats.backed_off += 1,
    }
    if outcome.has_image() {
        page.push_image(ImageRef::from_key(key));
    }
}
