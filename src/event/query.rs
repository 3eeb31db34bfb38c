//! Filtered, paginated event queries.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::error::Result;
use crate::event::{Category, EVENT_COLUMNS, EventRepository, EventRow};

/// Server-side cap on page size.
pub const MAX_LIMIT: u32 = 100;
/// Page size when the caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 12;

/// Filters applied to an event listing.
#[derive(Clone, Debug, Default)]
pub struct ListFilter {
    pub category: Option<Category>,
    /// Case-insensitive substring over title OR description. Blank means
    /// "no search filter" on the listing path.
    pub search: Option<String>,
    pub created_by: Option<Uuid>,
    /// Restrict to the requester's saved set. Meaningless without an
    /// identity.
    pub saved_only: bool,
}

/// 1-indexed pagination window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Build a window, rejecting out-of-bounds values.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        let mut errors = ValidationErrors::new();
        if page < 1 {
            errors.add(
                "page",
                ValidationError::new("range")
                    .with_message("Page numbering starts at 1.".into()),
            );
        }
        if limit < 1 || limit > MAX_LIMIT {
            errors.add(
                "limit",
                ValidationError::new("range")
                    .with_message("Limit must be between 1 and 100.".into()),
            );
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// `ceil(total / limit)`.
    pub fn total_pages(&self, total: i64) -> u32 {
        let total = u64::try_from(total).unwrap_or_default();
        total.div_ceil(u64::from(self.limit)).try_into().unwrap_or(u32::MAX)
    }
}

fn requester_required() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "saved",
        ValidationError::new("identity").with_message(
            "Filtering by saved events requires authentication.".into(),
        ),
    );
    errors
}

fn blank_query() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "q",
        ValidationError::new("blank")
            .with_message("Search query must not be empty.".into()),
    );
    errors
}

/// Escape `ILIKE` metacharacters so user input only ever matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl EventRepository {
    /// List events matching `filter`, ascending by date.
    ///
    /// Returns one page plus the total match count. When `requester` is
    /// present every row carries the derived `is_saved` flag.
    pub async fn list(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
        requester: Option<Uuid>,
    ) -> Result<(Vec<EventRow>, i64)> {
        if filter.saved_only && requester.is_none() {
            return Err(requester_required().into());
        }

        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(EVENT_COLUMNS).push(", ");
        match requester {
            Some(user_id) => {
                query
                    .push("EXISTS(SELECT 1 FROM saved_events s WHERE s.event_id = e.id AND s.user_id = ")
                    .push_bind(user_id)
                    .push(") AS is_saved");
            },
            None => {
                query.push("NULL::boolean AS is_saved");
            },
        }
        query.push(" FROM events e");
        push_filters(&mut query, filter, search, requester);
        query
            .push(" ORDER BY e.date ASC, e.id ASC LIMIT ")
            .push_bind(i64::from(pagination.limit()))
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM events e",
        );
        push_filters(&mut count, filter, search, requester);
        let (total,): (i64,) =
            count.build_query_as().fetch_one(&self.pool).await?;

        Ok((rows, total))
    }

    /// Free-text search across title, description and category.
    ///
    /// An empty or whitespace-only query is rejected: a full unfiltered
    /// scan is not distinguishable from a bug on this entry point.
    pub async fn search(
        &self,
        q: &str,
        pagination: Pagination,
        requester: Option<Uuid>,
    ) -> Result<(Vec<EventRow>, i64)> {
        let q = q.trim();
        if q.is_empty() {
            return Err(blank_query().into());
        }
        let pattern = like_pattern(q);

        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(EVENT_COLUMNS).push(", ");
        match requester {
            Some(user_id) => {
                query
                    .push("EXISTS(SELECT 1 FROM saved_events s WHERE s.event_id = e.id AND s.user_id = ")
                    .push_bind(user_id)
                    .push(") AS is_saved");
            },
            None => {
                query.push("NULL::boolean AS is_saved");
            },
        }
        query
            .push(" FROM events e WHERE (e.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.category ILIKE ")
            .push_bind(pattern.clone())
            .push(")")
            .push(" ORDER BY e.date ASC, e.id ASC LIMIT ")
            .push_bind(i64::from(pagination.limit()))
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM events e WHERE (e.title ILIKE ",
        );
        count
            .push_bind(pattern.clone())
            .push(" OR e.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.category ILIKE ")
            .push_bind(pattern)
            .push(")");
        let (total,): (i64,) =
            count.build_query_as().fetch_one(&self.pool).await?;

        Ok((rows, total))
    }
}

fn push_filters(
    query: &mut QueryBuilder<'_, Postgres>,
    filter: &ListFilter,
    search: Option<&str>,
    requester: Option<Uuid>,
) {
    if filter.saved_only {
        // Validated by the caller: saved_only implies a requester.
        if let Some(user_id) = requester {
            query
                .push(" INNER JOIN saved_events sv ON sv.event_id = e.id AND sv.user_id = ")
                .push_bind(user_id);
        }
    }

    query.push(" WHERE TRUE");

    if let Some(category) = filter.category {
        query
            .push(" AND e.category = ")
            .push_bind(category.as_str());
    }

    if let Some(needle) = search {
        let pattern = like_pattern(needle);
        query
            .push(" AND (e.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(creator) = filter.created_by {
        query.push(" AND e.created_by = ").push_bind(creator);
    }
}
