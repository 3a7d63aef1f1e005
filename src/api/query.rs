//! Fuzzy search over the fake collection.
//!
//! # Endpoints
//!
//! - `GET /experiment/query/fake/{text}` - Search by title
//! - `GET /experiment/search/fake/{text}` - Search by description
//!
//! Both accept `n` (default 3) and `key` (default `smart_descending`) query
//! parameters. Candidates are scored against a fresh snapshot of the
//! collection on every request.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::dto::{ExperimentResponse, SearchParams};
use super::handlers::AppState;
use crate::domain::{Experiment, Sorting};
use crate::infrastructure::{FuzzyMatcher, NucleoMatcher};

// =============================================================================
// Query Service
// =============================================================================

/// Text of a record that a search is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The experiment title.
    Title,
    /// The experiment description.
    Description,
}

impl Projection {
    /// Returns the projected text of `experiment`.
    #[must_use]
    pub fn project(self, experiment: &Experiment) -> &str {
        match self {
            Self::Title => &experiment.title,
            Self::Description => &experiment.description,
        }
    }
}

/// Ranks records against a query text.
#[derive(Clone)]
pub struct QueryService {
    matcher: Arc<dyn FuzzyMatcher>,
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("QueryService").finish_non_exhaustive()
    }
}

impl QueryService {
    /// Creates a service using the given matcher.
    #[must_use]
    pub fn new(matcher: Arc<dyn FuzzyMatcher>) -> Self {
        Self { matcher }
    }

    /// Returns the `n` best matches for `text`, ordered by `sorting`.
    ///
    /// The matcher keeps the top `n` candidates by score; `sorting` then
    /// reorders that selection. `n == 0` yields no results.
    #[must_use]
    pub fn query(
        &self,
        records: &[Experiment],
        text: &str,
        n: usize,
        sorting: Sorting,
        projection: Projection,
    ) -> Vec<Experiment> {
        if n == 0 || records.is_empty() {
            return Vec::new();
        }

        let choices: Vec<&str> = records
            .iter()
            .map(|record| projection.project(record))
            .collect();
        let ranked: Vec<Experiment> = self
            .matcher
            .extract(text, &choices, n)
            .into_iter()
            .map(|scored| records[scored.index].clone())
            .collect();

        let mut ordered = sorting.apply(ranked);
        ordered.truncate(n);
        ordered
    }
}

impl Default for QueryService {
    fn default() -> Self {
        Self::new(Arc::new(NucleoMatcher::new()))
    }
}

// =============================================================================
// GET /experiment/query/fake/{text}
// =============================================================================

/// Fuzzy search over fake experiment titles.
///
/// # Query Parameters
///
/// - `n`: Maximum number of results (default: 3)
/// - `key`: Result ordering (default: `smart_descending`)
///
/// # Response
///
/// - **200 OK**: Up to `n` experiments
/// - **400 Bad Request**: Unknown `key` or non-integer `n`
pub async fn query_fake_by_title(
    State(state): State<AppState>,
    Path(text): Path<String>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<ExperimentResponse>> {
    search(&state, &text, params, Projection::Title)
}

// =============================================================================
// GET /experiment/search/fake/{text}
// =============================================================================

/// Fuzzy search over fake experiment descriptions.
///
/// Accepts the same query parameters as [`query_fake_by_title`].
pub async fn search_fake_by_description(
    State(state): State<AppState>,
    Path(text): Path<String>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<ExperimentResponse>> {
    search(&state, &text, params, Projection::Description)
}

fn search(
    state: &AppState,
    text: &str,
    params: SearchParams,
    projection: Projection,
) -> Json<Vec<ExperimentResponse>> {
    let records = state.fake_experiments.list();
    let results = state
        .query_service
        .query(&records, text, params.limit(), params.key, projection);

    tracing::debug!(
        text,
        ?projection,
        n = params.n,
        key = %params.key,
        candidates = records.len(),
        results = results.len(),
        "Fake experiments searched"
    );

    Json(results.iter().map(ExperimentResponse::from).collect())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExperimentId;
    use crate::infrastructure::ScoredMatch;
    use rstest::{fixture, rstest};

    /// Ranks candidates by their position, last first.
    struct ReverseMatcher;

    impl FuzzyMatcher for ReverseMatcher {
        fn extract(&self, _query: &str, choices: &[&str], limit: usize) -> Vec<ScoredMatch> {
            (0..choices.len())
                .rev()
                .zip((1..=u32::MAX).rev())
                .map(|(index, score)| ScoredMatch { index, score })
                .take(limit)
                .collect()
        }
    }

    fn experiment(title: &str, description: &str, salary: f64, duration: u32) -> Experiment {
        Experiment::new(ExperimentId::generate(), title, description, salary, duration)
    }

    fn titles(records: &[Experiment]) -> Vec<&str> {
        records.iter().map(|record| record.title.as_str()).collect()
    }

    #[fixture]
    fn records() -> Vec<Experiment> {
        vec![
            experiment("Beta", "measure soil", 300.0, 5),
            experiment("Alpha", "grow crystals", 100.0, 20),
            experiment("Gamma", "count birds", 200.0, 10),
        ]
    }

    #[rstest]
    fn test_query_title_prefers_closest(records: Vec<Experiment>) {
        let service = QueryService::default();

        let results = service.query(&records, "Alph", 1, Sorting::SmartDescending, Projection::Title);

        assert_eq!(titles(&results), vec!["Alpha"]);
    }

    #[rstest]
    fn test_query_description_projection(records: Vec<Experiment>) {
        let service = QueryService::default();

        let results = service.query(
            &records,
            "crystals",
            1,
            Sorting::SmartDescending,
            Projection::Description,
        );

        assert_eq!(titles(&results), vec!["Alpha"]);
    }

    #[rstest]
    #[case(Sorting::SmartDescending, vec!["Gamma", "Alpha", "Beta"])]
    #[case(Sorting::SmartAscending, vec!["Beta", "Alpha", "Gamma"])]
    #[case(Sorting::CostAscending, vec!["Alpha", "Gamma", "Beta"])]
    #[case(Sorting::CostDescending, vec!["Beta", "Gamma", "Alpha"])]
    #[case(Sorting::DurationAscending, vec!["Beta", "Gamma", "Alpha"])]
    #[case(Sorting::DurationDescending, vec!["Alpha", "Gamma", "Beta"])]
    fn test_query_applies_sorting_to_match_order(
        records: Vec<Experiment>,
        #[case] sorting: Sorting,
        #[case] expected: Vec<&str>,
    ) {
        let service = QueryService::new(Arc::new(ReverseMatcher));

        let results = service.query(&records, "x", 3, sorting, Projection::Title);

        assert_eq!(titles(&results), expected);
    }

    #[rstest]
    fn test_query_sorts_only_selected_matches(records: Vec<Experiment>) {
        let service = QueryService::new(Arc::new(ReverseMatcher));

        let results = service.query(&records, "x", 2, Sorting::CostAscending, Projection::Title);

        assert_eq!(titles(&results), vec!["Alpha", "Gamma"]);
    }

    #[rstest]
    fn test_query_zero_results(records: Vec<Experiment>) {
        let service = QueryService::default();
        assert!(
            service
                .query(&records, "Alpha", 0, Sorting::default(), Projection::Title)
                .is_empty()
        );
    }

    #[rstest]
    fn test_query_caps_results_at_collection_size(records: Vec<Experiment>) {
        let service = QueryService::default();

        let results = service.query(&records, "a", 10, Sorting::default(), Projection::Title);

        assert_eq!(results.len(), 3);
    }

    #[rstest]
    fn test_query_empty_collection() {
        let service = QueryService::default();
        assert!(
            service
                .query(&[], "Alpha", 3, Sorting::default(), Projection::Title)
                .is_empty()
        );
    }
}
