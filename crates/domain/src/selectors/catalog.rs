//! Catalog selectors.

use chrono::{DateTime, Duration, Utc};

use crate::common::{contains_ignore_case, none_if_blank, ALL};
use crate::entities::{Category, Service};
use crate::ids::CategoryId;

/// Combined text and category filter over the service list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilter {
    pub text: Option<String>,
    /// `None` matches every category.
    pub category_id: Option<CategoryId>,
}

impl ServiceFilter {
    /// Build from the raw UI values, where `category` may be `"all"`.
    pub fn from_ui(text: &str, category: &str) -> Self {
        Self {
            text: none_if_blank(text).map(str::to_string),
            category_id: (category != ALL && !category.is_empty())
                .then(|| CategoryId::new(category)),
        }
    }

    pub fn matches(&self, service: &Service) -> bool {
        let text_matches = match self.text.as_deref() {
            None | Some("") => true,
            Some(text) => {
                contains_ignore_case(&service.name, text)
                    || service.features.iter().any(|f| contains_ignore_case(f, text))
            }
        };
        let category_matches = self
            .category_id
            .as_ref()
            .map_or(true, |id| service.category_id() == id);

        text_matches && category_matches
    }
}

pub fn filter_services<'a>(services: &'a [Service], filter: &ServiceFilter) -> Vec<&'a Service> {
    services.iter().filter(|s| filter.matches(s)).collect()
}

/// Case-insensitive match on category name or description.
pub fn filter_categories<'a>(categories: &'a [Category], text: &str) -> Vec<&'a Category> {
    categories
        .iter()
        .filter(|c| {
            contains_ignore_case(&c.name, text)
                || c.description
                    .as_deref()
                    .is_some_and(|d| contains_ignore_case(d, text))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub services: usize,
    pub categories: usize,
    pub categories_with_image: usize,
    /// Categories created during the seven days before `now`.
    pub recently_added_categories: usize,
}

impl CatalogStats {
    pub fn compute(services: &[Service], categories: &[Category], now: DateTime<Utc>) -> Self {
        let week_ago = now - Duration::days(7);
        Self {
            services: services.len(),
            categories: categories.len(),
            categories_with_image: categories.iter().filter(|c| c.image_ref.is_some()).count(),
            recently_added_categories: categories
                .iter()
                .filter(|c| c.created_at.is_some_and(|at| at > week_ago))
                .count(),
        }
    }
}
