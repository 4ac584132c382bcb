// 🔎 Catalog Search - filter, sort and paginate books

use crate::entities::{Book, MAX_RATING};
use crate::error::{LibraryError, Result};
use crate::store::LibraryStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Title,
    Author,
    PublishedDate,
    Rating,
    Popularity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Borrowed,
    #[default]
    All,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_after: Option<NaiveDate>,
    #[serde(default)]
    pub published_before: Option<NaiveDate>,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub max_rating: Option<f64>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_results: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub books: Vec<Book>,
    pub pagination: Pagination,
}

impl SearchQuery {
    pub fn validate(&self) -> Result<()> {
        for (field, rating) in [("min_rating", self.min_rating), ("max_rating", self.max_rating)] {
            if let Some(rating) = rating {
                if !(0.0..=MAX_RATING).contains(&rating) {
                    return Err(LibraryError::validation(field, "must be between 0 and 5"));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            if min > max {
                return Err(LibraryError::validation(
                    "min_rating",
                    "cannot be greater than max_rating",
                ));
            }
        }

        if let (Some(after), Some(before)) = (self.published_after, self.published_before) {
            if after > before {
                return Err(LibraryError::validation(
                    "published_after",
                    "cannot be later than published_before",
                ));
            }
        }

        Ok(())
    }

    fn accepts(&self, book: &Book) -> bool {
        if let Some(term) = self.q.as_deref().filter(|t| !t.is_empty()) {
            if !book.matches(term) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &book.category != category {
                return false;
            }
        }
        if let Some(author) = &self.author {
            if !book.author.to_lowercase().contains(&author.to_lowercase()) {
                return false;
            }
        }
        if self.min_rating.is_some_and(|min| book.rating < min) {
            return false;
        }
        if self.max_rating.is_some_and(|max| book.rating > max) {
            return false;
        }
        if self.published_after.is_some_and(|after| book.published_date < after) {
            return false;
        }
        if self.published_before.is_some_and(|before| book.published_date > before) {
            return false;
        }

        match self.availability {
            Availability::Available => book.is_available,
            Availability::Borrowed => !book.is_available,
            Availability::All => true,
        }
    }

    fn compare(&self, a: &Book, b: &Book) -> Ordering {
        let ordering = match self.sort_by {
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Author => a.author.to_lowercase().cmp(&b.author.to_lowercase()),
            SortField::PublishedDate => a.published_date.cmp(&b.published_date),
            SortField::Rating => a.rating.total_cmp(&b.rating),
            SortField::Popularity => a.borrowing_count.cmp(&b.borrowing_count),
        };

        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

pub fn search_books(store: &LibraryStore, query: &SearchQuery) -> Result<SearchPage> {
    query.validate()?;

    let mut books: Vec<Book> = store
        .all_books()
        .iter()
        .filter(|book| query.accepts(book))
        .cloned()
        .collect();
    books.sort_by(|a, b| query.compare(a, b));

    let per_page = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let current_page = query.page.unwrap_or(1).max(1);
    let total_results = books.len();
    let total_pages = total_results.div_ceil(per_page);

    let page: Vec<Book> = books
        .into_iter()
        .skip((current_page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    Ok(SearchPage {
        books: page,
        pagination: Pagination {
            current_page,
            total_pages,
            total_results,
            per_page,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_library;

    fn titles(page: &SearchPage) -> Vec<&str> {
        page.books.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn test_default_sort_by_title() {
        let store = sample_library().unwrap();
        let page = search_books(&store, &SearchQuery::default()).unwrap();

        assert_eq!(page.pagination.total_results, 5);
        assert_eq!(
            titles(&page),
            vec![
                "1984",
                "Pride and Prejudice",
                "The Catcher in the Rye",
                "The Great Gatsby",
                "To Kill a Mockingbird"
            ]
        );
    }

    #[test]
    fn test_text_search_and_availability() {
        let store = sample_library().unwrap();

        let query = SearchQuery {
            q: Some("fiction".to_string()),
            ..Default::default()
        };
        assert_eq!(search_books(&store, &query).unwrap().pagination.total_results, 3);

        let borrowed = SearchQuery {
            availability: Availability::Borrowed,
            ..Default::default()
        };
        let page = search_books(&store, &borrowed).unwrap();
        assert_eq!(titles(&page), vec!["Pride and Prejudice", "The Great Gatsby"]);
    }

    #[test]
    fn test_rating_sort_desc() {
        let store = sample_library().unwrap();
        let query = SearchQuery {
            min_rating: Some(4.3),
            sort_by: SortField::Rating,
            sort_order: SortOrder::Desc,
            ..Default::default()
        };

        let page = search_books(&store, &query).unwrap();
        assert_eq!(
            titles(&page),
            vec!["To Kill a Mockingbird", "Pride and Prejudice", "1984"]
        );
    }

    #[test]
    fn test_published_range() {
        let store = sample_library().unwrap();
        let query = SearchQuery {
            published_after: NaiveDate::from_ymd_opt(1940, 1, 1),
            published_before: NaiveDate::from_ymd_opt(1955, 12, 31),
            sort_by: SortField::PublishedDate,
            ..Default::default()
        };

        let page = search_books(&store, &query).unwrap();
        assert_eq!(titles(&page), vec!["1984", "The Catcher in the Rye"]);
    }

    #[test]
    fn test_pagination() {
        let store = sample_library().unwrap();
        let query = SearchQuery {
            page: Some(2),
            limit: Some(2),
            ..Default::default()
        };

        let page = search_books(&store, &query).unwrap();
        assert_eq!(titles(&page), vec!["The Catcher in the Rye", "The Great Gatsby"]);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.pagination.has_next);
        assert!(page.pagination.has_previous);

        let oversized = SearchQuery {
            limit: Some(1000),
            ..Default::default()
        };
        assert_eq!(
            search_books(&store, &oversized).unwrap().pagination.per_page,
            MAX_PAGE_SIZE
        );
    }

    #[test]
    fn test_page_far_past_the_end_is_empty() {
        let store = sample_library().unwrap();
        let query: SearchQuery = serde_json::from_str(r#"{"page": 18446744073709551615}"#).unwrap();
        assert_eq!(query.page, Some(usize::MAX));

        let page = search_books(&store, &query).unwrap();
        assert!(page.books.is_empty());
        assert_eq!(page.pagination.current_page, usize::MAX);
        assert_eq!(page.pagination.total_results, 5);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_previous);
    }

    #[test]
    fn test_invalid_queries() {
        let store = sample_library().unwrap();

        let inverted = SearchQuery {
            min_rating: Some(4.0),
            max_rating: Some(3.0),
            ..Default::default()
        };
        assert!(search_books(&store, &inverted).is_err());

        let out_of_range = SearchQuery {
            max_rating: Some(7.0),
            ..Default::default()
        };
        assert!(search_books(&store, &out_of_range).is_err());

        let dates = SearchQuery {
            published_after: NaiveDate::from_ymd_opt(2000, 1, 1),
            published_before: NaiveDate::from_ymd_opt(1990, 1, 1),
            ..Default::default()
        };
        assert_eq!(search_books(&store, &dates).unwrap_err().code(), "validation_error");
    }
}
