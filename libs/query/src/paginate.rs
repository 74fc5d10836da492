//! Result paginator

use crate::plan::QueryPlan;
use serde::{Deserialize, Serialize};

/// Descriptor of a neighbouring page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

/// One page of results plus the total number of matching records.
///
/// Built fresh per request; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub pagination: Pagination,
}

impl<T> PageResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            pagination: self.pagination,
        }
    }
}

/// Attach pagination descriptors to a page of `items` out of `count` matches.
///
/// `next` exists iff `skip + limit < count`, `prev` iff `page > 1`.
pub fn paginate<T>(plan: &QueryPlan, items: Vec<T>, count: u64) -> PageResult<T> {
    let end = plan.skip.saturating_add(plan.limit);

    let next = (end < count).then(|| PageLink {
        page: plan.page + 1,
        limit: plan.limit,
    });
    let prev = (plan.page > 1).then(|| PageLink {
        page: plan.page - 1,
        limit: plan.limit,
    });

    PageResult {
        items,
        count,
        pagination: Pagination { next, prev },
    }
}
