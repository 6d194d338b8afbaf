//! `SearchRequest` and its three entry paths — GET query, POST body,
//! direct invocation — normalized to one struct (spec §4.6).

use serde::Deserialize;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevance,
    EpisodePublishedUnixTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub sort_by: Option<SortBy>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub episode_ids: Option<Vec<String>>,
    #[serde(default)]
    pub is_health_check_only: Option<bool>,
}

impl SearchRequest {
    pub fn bounded_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    pub fn bounded_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    pub fn effective_sort_by(&self) -> SortBy {
        self.sort_by.unwrap_or(SortBy::Relevance)
    }

    pub fn effective_sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or(SortOrder::Desc)
    }

    pub fn is_health_check(&self) -> bool {
        self.is_health_check_only.unwrap_or(false)
    }

    /// Parse the GET query-string form: `q`, `sort`, `order`,
    /// `episodeIds=a,b`, `limit`, `offset`, `healthCheckOnly`.
    pub fn from_query_params(params: &[(String, String)]) -> Self {
        let mut req = SearchRequest {
            query: String::new(),
            limit: None,
            offset: None,
            sort_by: None,
            sort_order: None,
            episode_ids: None,
            is_health_check_only: None,
        };

        for (key, value) in params {
            match key.as_str() {
                "q" => req.query = value.clone(),
                "sort" => {
                    req.sort_by = match value.as_str() {
                        "relevance" => Some(SortBy::Relevance),
                        "episodePublishedUnixTimestamp" => Some(SortBy::EpisodePublishedUnixTimestamp),
                        _ => None,
                    }
                }
                "order" => {
                    req.sort_order = match value.as_str() {
                        "asc" => Some(SortOrder::Asc),
                        "desc" => Some(SortOrder::Desc),
                        _ => None,
                    }
                }
                "episodeIds" => {
                    req.episode_ids =
                        Some(value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                }
                "limit" => req.limit = value.parse().ok(),
                "offset" => req.offset = value.parse().ok(),
                "healthCheckOnly" => req.is_health_check_only = value.parse().ok(),
                _ => {}
            }
        }

        req
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_parse_episode_ids_as_csv() {
        let req = SearchRequest::from_query_params(&[
            ("q".to_string(), "hello".to_string()),
            ("episodeIds".to_string(), "1,2, 3".to_string()),
        ]);
        assert_eq!(req.query, "hello");
        assert_eq!(req.episode_ids, Some(vec!["1".to_string(), "2".to_string(), "3".to_string()]));
    }

    #[test]
    fn limit_is_bounded() {
        let mut req = SearchRequest::from_query_params(&[]);
        req.limit = Some(10_000);
        assert_eq!(req.bounded_limit(), MAX_LIMIT);
    }

    #[test]
    fn defaults_match_spec() {
        let req = SearchRequest::from_query_params(&[]);
        assert_eq!(req.bounded_limit(), DEFAULT_LIMIT);
        assert_eq!(req.bounded_offset(), 0);
        assert_eq!(req.effective_sort_by(), SortBy::Relevance);
        assert!(!req.is_health_check());
    }
}
