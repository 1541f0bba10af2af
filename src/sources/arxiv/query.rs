//! URL construction for the arXiv query API. Pure string building, no I/O.

use crate::models::{ArxivQuery, SortBy, SortOrder};
use crate::sources::ArxivError;

/// Base URL for arXiv API
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Largest page the API will serve
pub const MAX_RESULTS_CAP: usize = 2000;

/// Build a search URL against the public endpoint, sorted by submission date, newest first
///
/// Each whitespace-separated keyword token becomes an `all:` clause, the category a
/// `cat:` clause after them, and all clauses are AND-ed. Fails when neither yields a
/// clause.
pub fn build_search_query(
    category: Option<&str>,
    keyword: Option<&str>,
    start: usize,
    max_results: usize,
) -> Result<String, ArxivError> {
    let query = ArxivQuery {
        category: category.map(str::to_string),
        keyword: keyword.map(str::to_string),
        start,
        max_results,
        ..ArxivQuery::default()
    };
    build_query_url(ARXIV_API_URL, &query)
}

/// Build an `id_list` URL against the public endpoint
pub fn build_id_list_query<S: AsRef<str>>(ids: &[S]) -> String {
    id_list_url(ARXIV_API_URL, ids)
}

/// Build the URL for any query against `base_url`
///
/// Ids alone produce an `id_list` request without pagination. Search criteria produce
/// a paginated, sorted `search_query` request, restricted to `ids` when both are given.
pub fn build_query_url(base_url: &str, query: &ArxivQuery) -> Result<String, ArxivError> {
    let clauses = search_clauses(query.category.as_deref(), query.keyword.as_deref());

    if clauses.is_empty() {
        if query.ids.is_empty() {
            return Err(ArxivError::Construction(
                "a category, keyword or id list is required".to_string(),
            ));
        }
        return Ok(id_list_url(base_url, &query.ids));
    }

    if query.max_results == 0 {
        return Err(ArxivError::Construction(
            "max_results must be at least 1".to_string(),
        ));
    }
    let max_results = if query.max_results > MAX_RESULTS_CAP {
        tracing::debug!(
            "max_results {} exceeds the API cap, using {}",
            query.max_results,
            MAX_RESULTS_CAP
        );
        MAX_RESULTS_CAP
    } else {
        query.max_results
    };

    let mut url = format!("{}?search_query={}", base_url, clauses.join("+AND+"));
    if !query.ids.is_empty() {
        url.push_str("&id_list=");
        url.push_str(&join_ids(&query.ids));
    }
    url.push_str(&pagination(
        query.start,
        max_results,
        query.sort_by,
        query.sort_order,
    ));
    Ok(url)
}

fn search_clauses(category: Option<&str>, keyword: Option<&str>) -> Vec<String> {
    let mut clauses: Vec<String> = keyword
        .unwrap_or_default()
        .split_whitespace()
        .map(|token| format!("all:{}", urlencoding::encode(token)))
        .collect();

    if let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) {
        clauses.push(format!("cat:{}", urlencoding::encode(category)));
    }

    clauses
}

fn pagination(start: usize, max_results: usize, sort_by: SortBy, sort_order: SortOrder) -> String {
    format!(
        "&start={}&max_results={}&sortBy={}&sortOrder={}",
        start,
        max_results,
        sort_by.as_param(),
        sort_order.as_param()
    )
}

fn id_list_url<S: AsRef<str>>(base_url: &str, ids: &[S]) -> String {
    format!("{}?id_list={}", base_url, join_ids(ids))
}

fn join_ids<S: AsRef<str>>(ids: &[S]) -> String {
    ids.iter()
        .map(|id| urlencoding::encode(id.as_ref().trim()).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_is_deterministic() {
        let first = build_search_query(Some("cs.AI"), Some("transformers attention"), 0, 10).unwrap();
        let second = build_search_query(Some("cs.AI"), Some("transformers attention"), 0, 10).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            "http://export.arxiv.org/api/query?search_query=all:transformers+AND+all:attention+AND+cat:cs.AI\
             &start=0&max_results=10&sortBy=submittedDate&sortOrder=descending"
        );
    }

    #[test]
    fn test_search_query_requires_criteria() {
        let err = build_search_query(None, None, 0, 10).unwrap_err();
        assert!(matches!(err, ArxivError::Construction(_)));

        // Whitespace-only input yields no clauses either
        let err = build_search_query(Some("  "), Some(" \n\t "), 0, 10).unwrap_err();
        assert!(matches!(err, ArxivError::Construction(_)));
    }

    #[test]
    fn test_keyword_tokens_become_and_clauses_in_order() {
        let url = build_search_query(None, Some("graph  neural\tnetworks"), 0, 10).unwrap();
        assert!(url.contains("search_query=all:graph+AND+all:neural+AND+all:networks&"));
        assert_eq!(url.matches("all:").count(), 3);
        assert!(!url.contains("cat:"));
    }

    #[test]
    fn test_category_only() {
        let url = build_search_query(Some("cs.LG"), None, 40, 20).unwrap();
        assert!(url.contains("search_query=cat:cs.LG&start=40&max_results=20"));
    }

    #[test]
    fn test_tokens_are_percent_encoded() {
        let url = build_search_query(None, Some("\"diffusion\" c++"), 0, 10).unwrap();
        assert!(url.contains("all:%22diffusion%22+AND+all:c%2B%2B"));
    }

    #[test]
    fn test_max_results_capped_and_validated() {
        let url = build_search_query(Some("cs.AI"), None, 0, 5000).unwrap();
        assert!(url.contains("max_results=2000"));

        let err = build_search_query(Some("cs.AI"), None, 0, 0).unwrap_err();
        assert!(matches!(err, ArxivError::Construction(_)));
    }

    #[test]
    fn test_id_list_query_keeps_order_without_pagination() {
        let url = build_id_list_query(&["2101.00001", "2002.00002"]);
        assert_eq!(
            url,
            "http://export.arxiv.org/api/query?id_list=2101.00001,2002.00002"
        );
        assert!(!url.contains("start="));
        assert!(!url.contains("max_results="));
    }

    #[test]
    fn test_query_url_with_ids_only() {
        let query = ArxivQuery::new().ids(["math/0104020v1"]);
        let url = build_query_url("http://localhost/api/query", &query).unwrap();
        assert_eq!(url, "http://localhost/api/query?id_list=math%2F0104020v1");
    }

    #[test]
    fn test_query_url_combines_search_and_ids() {
        let query = ArxivQuery::new()
            .category("cs.AI")
            .ids(["2101.00001"])
            .sort_by(SortBy::Relevance)
            .sort_order(SortOrder::Ascending);
        let url = build_query_url(ARXIV_API_URL, &query).unwrap();
        assert!(url.contains("search_query=cat:cs.AI&id_list=2101.00001&start=0"));
        assert!(url.ends_with("sortBy=relevance&sortOrder=ascending"));
    }
}
