//! View models handed to renderers.
//!
//! A view reads the published state of its source, deduplicates the
//! records and then either classifies them into sections (studio pages) or
//! runs them through the filter engine on a worker (smart filter).

use crate::error::LoadOptions;
use crate::fetch::{FetchOrchestrator, FetchState, FetchStatus};
use catalog::{dedupe, RecommendationRecord, SourceId};
use pipeline::{classify, CategoryBucket, FilterSpec, RuleSet};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use worker::{FilterClient, FilterOutcome};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum ViewData {
    Records(Vec<RecommendationRecord>),
    Buckets(Vec<CategoryBucket>),
}

impl ViewData {
    pub fn len(&self) -> usize {
        match self {
            ViewData::Records(records) => records.len(),
            ViewData::Buckets(buckets) => buckets.iter().map(|b| b.members.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a renderer needs for one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub source_id: SourceId,
    pub status: FetchStatus,
    pub data: ViewData,
    /// User-facing message; with `status == Succeeded` it is a warning
    pub error: Option<String>,
    /// Present when the error can be retried
    pub retry: Option<LoadOptions>,
    pub is_stale: bool,
    pub refreshing: bool,
}

impl ViewModel {
    fn from_state(source_id: &str, state: &FetchState, data: ViewData) -> Self {
        Self {
            source_id: source_id.to_string(),
            status: state.status,
            data,
            error: state.error.as_ref().map(|e| e.to_string()),
            retry: state.error.as_ref().map(|e| e.retry()),
            is_stale: state.is_stale,
            refreshing: state.refreshing,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Fetching
    }
}

/// Deduplicated records of a source, empty unless it succeeded.
fn displayable(state: &FetchState) -> Vec<RecommendationRecord> {
    if state.status == FetchStatus::Succeeded {
        dedupe(state.records.as_ref().clone())
    } else {
        Vec::new()
    }
}

/// Build the sectioned view of a studio page from a source state.
pub fn studio_view(source_id: &str, state: &FetchState, rules: &RuleSet) -> ViewModel {
    let records = displayable(state);
    let buckets = classify(&records, rules).buckets;
    ViewModel::from_state(source_id, state, ViewData::Buckets(buckets))
}

/// A studio page: one source classified with one rule set.
pub struct StudioPage {
    orchestrator: Arc<FetchOrchestrator>,
    source_id: SourceId,
    rules: RuleSet,
}

impl StudioPage {
    pub fn new(orchestrator: Arc<FetchOrchestrator>, source_id: impl Into<SourceId>, rules: RuleSet) -> Self {
        Self {
            orchestrator,
            source_id: source_id.into(),
            rules,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Load the source and build the view.
    ///
    /// Load failures are carried in the view model, not returned.
    pub async fn load(&self, options: LoadOptions) -> ViewModel {
        let start_time = Instant::now();
        if let Err(e) = self.orchestrator.load(&self.source_id, options).await {
            warn!("Studio page '{}' has no records: {}", self.source_id, e);
        }
        let view = self.view();
        info!(
            "Built studio page '{}' with {} records in {:.2?}",
            self.source_id,
            view.data.len(),
            start_time.elapsed()
        );
        view
    }

    /// View of whatever state the source is in now.
    pub fn view(&self) -> ViewModel {
        studio_view(
            &self.source_id,
            &self.orchestrator.state(&self.source_id),
            &self.rules,
        )
    }
}

/// The smart-filter view: one source narrowed by user settings.
pub struct SmartFilterView {
    orchestrator: Arc<FetchOrchestrator>,
    source_id: SourceId,
    client: FilterClient,
}

impl SmartFilterView {
    pub fn new(orchestrator: Arc<FetchOrchestrator>, source_id: impl Into<SourceId>, client: FilterClient) -> Self {
        Self {
            orchestrator,
            source_id: source_id.into(),
            client,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub async fn load(&self, options: LoadOptions) -> FetchState {
        if let Err(e) = self.orchestrator.load(&self.source_id, options).await {
            warn!("Smart filter source '{}' has no records: {}", self.source_id, e);
        }
        self.orchestrator.state(&self.source_id)
    }

    /// Filter the loaded records with `spec`.
    ///
    /// Returns `None` when a newer call made this result obsolete; the
    /// caller keeps showing whatever the newer call produces. A worker
    /// failure is reported in this view only.
    pub async fn apply(&self, spec: FilterSpec, watched_titles: &HashSet<String>) -> Option<ViewModel> {
        let start_time = Instant::now();
        let state = self.orchestrator.state(&self.source_id);
        let records = displayable(&state);
        let input_count = records.len();

        let mut view = ViewModel::from_state(&self.source_id, &state, ViewData::Records(Vec::new()));
        if state.status != FetchStatus::Succeeded {
            return Some(view);
        }

        match self.client.filter(records, spec, watched_titles.clone()).await {
            Ok(FilterOutcome::Current(filtered)) => {
                info!(
                    "Smart filter on '{}': {} -> {} records in {:.2?}",
                    self.source_id,
                    input_count,
                    filtered.len(),
                    start_time.elapsed()
                );
                view.data = ViewData::Records(filtered);
                Some(view)
            }
            Ok(FilterOutcome::Superseded { .. }) => None,
            Err(e) => {
                warn!("Smart filter on '{}' failed: {}", self.source_id, e);
                view.error = Some(e.to_string());
                view.retry = None;
                Some(view)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, FetchOperation};
    use pipeline::{Predicate, Rule};

    fn succeeded(records: Vec<RecommendationRecord>) -> FetchState {
        FetchState {
            status: FetchStatus::Succeeded,
            records: Arc::new(records),
            ..FetchState::default()
        }
    }

    fn rules() -> RuleSet {
        RuleSet::new(vec![
            Rule::new("Top", Predicate::MinRating(8.5), 4),
            Rule::new("Rest", Predicate::Always, 4),
        ])
        .unwrap()
    }

    #[test]
    fn test_studio_view_dedupes_before_classifying() {
        let state = succeeded(vec![
            RecommendationRecord::new("Monster").with_rating(8.9),
            RecommendationRecord::new("monster ").with_rating(8.9),
            RecommendationRecord::new("Trigun").with_rating(7.8),
        ]);

        let view = studio_view("madhouse", &state, &rules());

        assert_eq!(view.status, FetchStatus::Succeeded);
        assert_eq!(view.data.len(), 2);
        assert!(view.error.is_none());
    }

    #[test]
    fn test_failed_state_has_empty_buckets_and_retry() {
        let error = FetchError::Failed {
            source_id: "madhouse".to_string(),
            operation: FetchOperation::Load,
            message: "offline".to_string(),
        };
        let state = FetchState {
            status: FetchStatus::Failed,
            error: Some(error),
            ..FetchState::default()
        };

        let view = studio_view("madhouse", &state, &rules());

        assert!(view.data.is_empty());
        assert_eq!(view.retry, Some(LoadOptions::default()));
        assert!(view.error.unwrap().contains("offline"));
    }

    #[test]
    fn test_view_model_serializes_for_renderers() {
        let state = FetchState {
            is_stale: true,
            ..succeeded(vec![RecommendationRecord::new("Trigun").with_rating(7.8)])
        };

        let json = serde_json::to_value(studio_view("madhouse", &state, &rules())).unwrap();

        assert_eq!(json["sourceId"], "madhouse");
        assert_eq!(json["status"], "succeeded");
        assert_eq!(json["isStale"], true);
        assert_eq!(json["data"]["kind"], "buckets");
        assert_eq!(json["data"]["items"][1]["name"], "Rest");
        assert_eq!(json["data"]["items"][1]["members"][0]["title"], "Trigun");
    }
}
