//! Parsing and evaluation of list filters.
//!
//! Limit and offset are strict: anything that is not an in-range integer is
//! rejected with a [`ValidationError`]. Score bounds are permissive: an
//! unparseable value is treated as if the parameter were absent, and a bound
//! only filters records when it is strictly positive.

use std::collections::HashSet;
use std::hash::Hash;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use super::QueryParams;
use crate::catalog::Catalog;
use crate::constants::limits::{DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};
use crate::models::anime::{Anime, AnimeStatus, AnimeType, UnknownVariant};

/// A rejected list request. `reason` is safe to return to the client as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    fn invalid_value(field: &'static str, err: &UnknownVariant) -> Self {
        Self::new(field, format!("invalid value for {field}: {err}"))
    }
}

/// Inclusion or exclusion over a set of values. Only one side can be active.
#[derive(Debug, Clone)]
pub enum SetFilter<T> {
    Any,
    Include(HashSet<T>),
    Exclude(HashSet<T>),
}

impl<T: Eq + Hash> SetFilter<T> {
    #[must_use]
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Include(set) => set.contains(value),
            Self::Exclude(set) => !set.contains(value),
        }
    }
}

/// Equality or inequality against a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFilter<T> {
    Any,
    Is(T),
    IsNot(T),
}

impl<T: PartialEq> ValueFilter<T> {
    #[must_use]
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Is(v) => v == value,
            Self::IsNot(v) => v != value,
        }
    }
}

/// How `genre_in` is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenreMatch {
    /// At least one included genre.
    #[default]
    Any,
    /// Every included genre.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Validated filters for one list request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSpec {
    pub types: SetFilter<AnimeType>,
    pub status: ValueFilter<AnimeStatus>,
    /// As parsed. Applied only when strictly positive.
    pub min_score: Option<f32>,
    /// As parsed. Applied only when strictly positive.
    pub max_score: Option<f32>,
    pub genres_in: HashSet<String>,
    pub genres_not_in: HashSet<String>,
    pub genre_match: GenreMatch,
    pub window: Window,
}

impl<T: Eq + Hash> PartialEq for SetFilter<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, Self::Any) => true,
            (Self::Include(a), Self::Include(b)) | (Self::Exclude(a), Self::Exclude(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: Eq + Hash> Eq for SetFilter<T> {}

impl<T> Default for SetFilter<T> {
    fn default() -> Self {
        Self::Any
    }
}

impl<T> Default for ValueFilter<T> {
    fn default() -> Self {
        Self::Any
    }
}

impl FilterSpec {
    /// Builds a filter from raw query parameters.
    ///
    /// `type_in` wins over `type_not_in` and `status` wins over `status_not`;
    /// the losing parameter is ignored without being validated.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first offending parameter.
    pub fn parse(params: &QueryParams) -> Result<Self, ValidationError> {
        let window = Window {
            limit: parse_limit(params.get_non_empty("limit"))?,
            offset: parse_offset(params.get_non_empty("offset"))?,
        };

        let types = if params.contains("type_in") {
            if params.contains("type_not_in") {
                debug!("type_in and type_not_in both given, ignoring type_not_in");
            }
            SetFilter::Include(parse_set(params, "type_in")?)
        } else if params.contains("type_not_in") {
            SetFilter::Exclude(parse_set(params, "type_not_in")?)
        } else {
            SetFilter::Any
        };

        let status = if let Some(raw) = params.get_non_empty("status") {
            ValueFilter::Is(parse_value(raw, "status")?)
        } else if let Some(raw) = params.get_non_empty("status_not") {
            ValueFilter::IsNot(parse_value(raw, "status_not")?)
        } else {
            ValueFilter::Any
        };

        let min_score = parse_score(params.get("min_score"));
        let max_score = parse_score(params.get("max_score"));
        if let (Some(min), Some(max)) = (min_score, max_score)
            && min > max
        {
            return Err(ValidationError::new(
                "min_score",
                "min_score cannot be greater than max_score",
            ));
        }

        let genres_in: HashSet<String> = params
            .get_all("genre_in")
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();

        let mut genres_not_in = HashSet::new();
        for genre in params.get_all("genre_not_in").filter(|g| !g.is_empty()) {
            if genres_in.contains(genre) {
                return Err(ValidationError::new(
                    "genre_not_in",
                    format!("genre_in and genre_not_in cannot contain the same genre: {genre:?}"),
                ));
            }
            genres_not_in.insert(genre.to_string());
        }

        let genre_match = if params.get("all_genres") == Some("true") {
            GenreMatch::All
        } else {
            GenreMatch::Any
        };

        Ok(Self {
            types,
            status,
            min_score,
            max_score,
            genres_in,
            genres_not_in,
            genre_match,
            window,
        })
    }

    /// Whether `anime` passes every predicate, checked in the order type,
    /// status, score, genres.
    #[must_use]
    pub fn matches(&self, anime: &Anime) -> bool {
        self.types.admits(&anime.anime_type)
            && self.status.admits(&anime.status)
            && self.score_admits(anime.score)
            && self.genres_admit(anime)
    }

    fn score_admits(&self, score: f32) -> bool {
        active_bound(self.min_score).is_none_or(|min| score >= min)
            && active_bound(self.max_score).is_none_or(|max| score <= max)
    }

    fn genres_admit(&self, anime: &Anime) -> bool {
        if anime.genres.iter().any(|g| self.genres_not_in.contains(g)) {
            return false;
        }

        if self.genres_in.is_empty() {
            return true;
        }

        match self.genre_match {
            GenreMatch::Any => anime.genres.iter().any(|g| self.genres_in.contains(g)),
            GenreMatch::All => self.genres_in.iter().all(|g| anime.has_genre(g)),
        }
    }

    /// Scans `catalog` in id order and returns the requested window of
    /// matches. Stops as soon as the window is full.
    #[must_use]
    pub fn evaluate<'c>(&self, catalog: &'c Catalog) -> Vec<&'c Anime> {
        catalog
            .all()
            .iter()
            .filter(|anime| self.matches(anime))
            .skip(self.window.offset)
            .take(self.window.limit)
            .collect()
    }
}

fn parse_limit(raw: Option<&str>) -> Result<usize, ValidationError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_LIMIT);
    };

    raw.parse::<usize>()
        .ok()
        .filter(|n| (MIN_LIMIT..=MAX_LIMIT).contains(n))
        .ok_or_else(|| {
            ValidationError::new(
                "limit",
                format!("limit must be an integer between {MIN_LIMIT} and {MAX_LIMIT}"),
            )
        })
}

fn parse_offset(raw: Option<&str>) -> Result<usize, ValidationError> {
    let Some(raw) = raw else {
        return Ok(0);
    };

    raw.parse::<usize>()
        .map_err(|_| ValidationError::new("offset", "offset must be a non-negative integer"))
}

fn parse_value<T>(raw: &str, field: &'static str) -> Result<T, ValidationError>
where
    T: FromStr<Err = UnknownVariant>,
{
    raw.parse()
        .map_err(|err| ValidationError::invalid_value(field, &err))
}

fn parse_set<T>(params: &QueryParams, field: &'static str) -> Result<HashSet<T>, ValidationError>
where
    T: FromStr<Err = UnknownVariant> + Eq + Hash,
{
    params
        .get_all(field)
        .map(|raw| parse_value(raw, field))
        .collect()
}

fn parse_score(raw: Option<&str>) -> Option<f32> {
    raw.and_then(|s| s.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
}

/// Zero and below is not a meaningful score bound.
fn active_bound(bound: Option<f32>) -> Option<f32> {
    bound.filter(|v| *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::anime;

    fn spec(query: &str) -> Result<FilterSpec, ValidationError> {
        FilterSpec::parse(&QueryParams::parse(query))
    }

    fn ids(results: &[&Anime]) -> Vec<u32> {
        results.iter().map(|a| a.id).collect()
    }

    fn record(
        id: u32,
        anime_type: AnimeType,
        status: AnimeStatus,
        score: f32,
        genres: &[&str],
    ) -> Anime {
        Anime {
            anime_type,
            status,
            score,
            genres: genres.iter().map(|g| (*g).to_string()).collect(),
            ..anime(id)
        }
    }

    fn sample_catalog() -> Catalog {
        use AnimeStatus::{Airing, Finished, Planned};
        use AnimeType::{Movie, Ova, Tv};

        Catalog::from_records(vec![
            record(1, Tv, Finished, 8.5, &["Action", "Drama"]),
            record(2, Movie, Finished, 7.2, &["Drama", "Romance"]),
            record(3, Tv, Airing, 6.1, &["Comedy"]),
            record(4, Ova, Finished, 5.0, &["Action"]),
            record(5, Tv, Planned, 0.0, &[]),
            record(6, Movie, Airing, 9.0, &["Action", "Romance", "Drama"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let filter = spec("").unwrap();
        assert_eq!(filter, FilterSpec::default());
        assert_eq!(filter.window.limit, 100);
        assert_eq!(filter.window.offset, 0);
    }

    #[test]
    fn test_limit_bounds() {
        assert_eq!(spec("limit=1").unwrap().window.limit, 1);
        assert_eq!(spec("limit=1000").unwrap().window.limit, 1000);
        assert_eq!(spec("limit=").unwrap().window.limit, 100);

        for bad in ["limit=0", "limit=1001", "limit=-1", "limit=abc", "limit=2.5"] {
            let err = spec(bad).unwrap_err();
            assert_eq!(err.field, "limit", "{bad}");
        }
    }

    #[test]
    fn test_offset_validation() {
        assert_eq!(spec("offset=25").unwrap().window.offset, 25);
        assert_eq!(spec("offset=").unwrap().window.offset, 0);

        let err = spec("offset=-1").unwrap_err();
        assert_eq!(err.field, "offset");
        assert_eq!(err.reason, "offset must be a non-negative integer");
        assert!(spec("offset=ten").is_err());
    }

    #[test]
    fn test_type_filters() {
        let filter = spec("type_in=TV&type_in=MOVIE").unwrap();
        assert_eq!(
            filter.types,
            SetFilter::Include([AnimeType::Tv, AnimeType::Movie].into_iter().collect())
        );

        let filter = spec("type_not_in=OVA").unwrap();
        assert!(matches!(filter.types, SetFilter::Exclude(_)));

        let err = spec("type_in=TV&type_in=CARTOON").unwrap_err();
        assert_eq!(err.field, "type_in");
        assert_eq!(
            err.reason,
            "invalid value for type_in: invalid AnimeType: \"CARTOON\""
        );
    }

    #[test]
    fn test_type_in_takes_precedence() {
        // The exclusion list is ignored entirely, invalid values included.
        let filter = spec("type_not_in=BOGUS&type_in=TV").unwrap();
        assert_eq!(
            filter.types,
            SetFilter::Include([AnimeType::Tv].into_iter().collect())
        );
    }

    #[test]
    fn test_status_filters() {
        assert_eq!(
            spec("status=AIRING").unwrap().status,
            ValueFilter::Is(AnimeStatus::Airing)
        );
        assert_eq!(
            spec("status_not=PLANNED").unwrap().status,
            ValueFilter::IsNot(AnimeStatus::Planned)
        );
        assert_eq!(
            spec("status=FINISHED&status_not=FINISHED").unwrap().status,
            ValueFilter::Is(AnimeStatus::Finished)
        );

        let err = spec("status_not=done").unwrap_err();
        assert_eq!(err.field, "status_not");
    }

    #[test]
    fn test_score_parsing_is_permissive() {
        let filter = spec("min_score=abc&max_score=").unwrap();
        assert_eq!(filter.min_score, None);
        assert_eq!(filter.max_score, None);

        assert_eq!(spec("min_score=NaN").unwrap().min_score, None);
        assert_eq!(spec("min_score=inf").unwrap().min_score, None);
        assert_eq!(spec("min_score=0").unwrap().min_score, Some(0.0));
        assert_eq!(spec("max_score=7.5").unwrap().max_score, Some(7.5));
    }

    #[test]
    fn test_inverted_score_range_is_rejected() {
        let err = spec("min_score=7&max_score=5").unwrap_err();
        assert_eq!(err.field, "min_score");
        assert_eq!(err.reason, "min_score cannot be greater than max_score");

        assert!(spec("min_score=5&max_score=5").is_ok());
        assert!(spec("min_score=0&max_score=7").is_ok());
        assert!(spec("min_score=7&max_score=abc").is_ok());
    }

    #[test]
    fn test_inverted_range_with_non_positive_bounds_is_rejected() {
        let err = spec("min_score=7&max_score=0").unwrap_err();
        assert_eq!(err.reason, "min_score cannot be greater than max_score");
        assert!(spec("min_score=-1&max_score=-5").is_err());
    }

    #[test]
    fn test_non_positive_bounds_do_not_filter() {
        let catalog = sample_catalog();
        let all = ids(&spec("").unwrap().evaluate(&catalog));

        assert_eq!(ids(&spec("min_score=0").unwrap().evaluate(&catalog)), all);
        assert_eq!(ids(&spec("max_score=0").unwrap().evaluate(&catalog)), all);
        assert_eq!(
            ids(&spec("min_score=-5&max_score=-1").unwrap().evaluate(&catalog)),
            all
        );
    }

    #[test]
    fn test_conflicting_genres() {
        let err = spec("genre_in=Action&genre_not_in=Drama&genre_not_in=Action").unwrap_err();
        assert_eq!(err.field, "genre_not_in");
        assert_eq!(
            err.reason,
            "genre_in and genre_not_in cannot contain the same genre: \"Action\""
        );
    }

    #[test]
    fn test_all_genres_flag() {
        assert_eq!(spec("all_genres=true").unwrap().genre_match, GenreMatch::All);
        assert_eq!(spec("all_genres=1").unwrap().genre_match, GenreMatch::Any);
        assert_eq!(spec("all_genres=TRUE").unwrap().genre_match, GenreMatch::Any);
    }

    #[test]
    fn test_evaluate_type_include_exclude_partition() {
        let catalog = sample_catalog();
        let included = spec("type_in=TV&type_in=OVA").unwrap().evaluate(&catalog);
        let excluded = spec("type_not_in=TV&type_not_in=OVA")
            .unwrap()
            .evaluate(&catalog);

        assert_eq!(ids(&included), vec![1, 3, 4, 5]);
        assert_eq!(ids(&excluded), vec![2, 6]);
    }

    #[test]
    fn test_evaluate_status() {
        let catalog = sample_catalog();
        assert_eq!(
            ids(&spec("status=AIRING").unwrap().evaluate(&catalog)),
            vec![3, 6]
        );
        assert_eq!(
            ids(&spec("status_not=FINISHED").unwrap().evaluate(&catalog)),
            vec![3, 5, 6]
        );
    }

    #[test]
    fn test_evaluate_score_range() {
        let catalog = sample_catalog();
        assert_eq!(
            ids(&spec("min_score=7").unwrap().evaluate(&catalog)),
            vec![1, 2, 6]
        );
        assert_eq!(
            ids(&spec("max_score=6.1").unwrap().evaluate(&catalog)),
            vec![3, 4, 5]
        );
        assert_eq!(
            ids(&spec("min_score=6&max_score=8.5").unwrap().evaluate(&catalog)),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_evaluate_genres_any_and_all() {
        let catalog = sample_catalog();

        let any = spec("genre_in=Action&genre_in=Romance")
            .unwrap()
            .evaluate(&catalog);
        assert_eq!(ids(&any), vec![1, 2, 4, 6]);

        let all = spec("genre_in=Action&genre_in=Romance&all_genres=true")
            .unwrap()
            .evaluate(&catalog);
        assert_eq!(ids(&all), vec![6]);
    }

    #[test]
    fn test_evaluate_genre_exclusion() {
        let catalog = sample_catalog();

        let results = spec("genre_not_in=Drama").unwrap().evaluate(&catalog);
        assert_eq!(ids(&results), vec![3, 4, 5]);

        let results = spec("genre_in=Action&genre_not_in=Romance")
            .unwrap()
            .evaluate(&catalog);
        assert_eq!(ids(&results), vec![1, 4]);
    }

    #[test]
    fn test_duplicate_record_genres_do_not_satisfy_all() {
        let catalog = Catalog::from_records(vec![record(
            1,
            AnimeType::Tv,
            AnimeStatus::Finished,
            7.0,
            &["Action", "Action"],
        )])
        .unwrap();

        let results = spec("genre_in=Action&genre_in=Drama&all_genres=true")
            .unwrap()
            .evaluate(&catalog);
        assert!(results.is_empty());
    }

    #[test]
    fn test_window_equals_drop_then_take() {
        let catalog = sample_catalog();
        let full = ids(&spec("limit=1000").unwrap().evaluate(&catalog));

        for offset in 0..=7 {
            for limit in 1..=7 {
                let query = format!("offset={offset}&limit={limit}");
                let window = ids(&spec(&query).unwrap().evaluate(&catalog));
                let expected: Vec<u32> = full.iter().copied().skip(offset).take(limit).collect();
                assert_eq!(window, expected, "{query}");
            }
        }
    }

    #[test]
    fn test_offset_past_matches_is_empty() {
        let catalog = sample_catalog();
        assert!(spec("offset=6").unwrap().evaluate(&catalog).is_empty());
        assert!(
            spec("status=AIRING&offset=2")
                .unwrap()
                .evaluate(&catalog)
                .is_empty()
        );
    }

    #[test]
    fn test_results_keep_catalog_order() {
        let catalog = sample_catalog();
        let results = spec("genre_in=Drama&genre_in=Comedy")
            .unwrap()
            .evaluate(&catalog);
        assert!(results.windows(2).all(|w| w[0].id < w[1].id));
    }
}
