//! Derived, read-only views over a list of books.

use crate::Book;
use std::cmp::Ordering;

/// How many books the "top rated" view shows by default.
pub const DEFAULT_TOP_RATED: usize = 5;

/// Books whose status is "reading" (case-insensitive), in the order given.
pub fn reading(books: &[Book]) -> Vec<Book> {
    books.iter().filter(|book| book.is_reading()).cloned().collect()
}

/// The `n` highest-rated books.
///
/// Ordered by average rating (descending), ties broken by review count
/// (descending). Books with a non-finite rating sort after everything else.
pub fn top_rated(books: &[Book], n: usize) -> Vec<Book> {
    let mut sorted: Vec<&Book> = books.iter().collect();
    sorted.sort_by(|a, b| compare_rating(b, a).then_with(|| b.review_count.cmp(&a.review_count)));
    sorted.into_iter().take(n).cloned().collect()
}

fn compare_rating(a: &Book, b: &Book) -> Ordering {
    match (a.avg_rating.is_finite(), b.avg_rating.is_finite()) {
        (true, true) => a.avg_rating.total_cmp(&b.avg_rating),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, status: &str, reviews: u32, rating: f64) -> Book {
        Book::new(id, format!("Title {id}"), "Author", "Genre", status).with_reviews(reviews, rating)
    }

    fn ids(books: &[Book]) -> Vec<i64> {
        books.iter().map(|b| b.id).collect()
    }

    #[test]
    fn test_reading_keeps_order() {
        let books = vec![book(1, "Reading", 0, 0.0), book(2, "read", 0, 0.0), book(3, "reading", 0, 0.0)];
        assert_eq!(ids(&reading(&books)), vec![1, 3]);
    }

    #[test]
    fn test_reading_empty() {
        assert!(reading(&[]).is_empty());
    }

    #[test]
    fn test_top_rated_orders_by_rating_then_reviews() {
        let books = vec![
            book(1, "read", 10, 4.0),
            book(2, "read", 50, 4.5),
            book(3, "read", 80, 4.5),
            book(4, "read", 5, 2.0),
        ];
        assert_eq!(ids(&top_rated(&books, 3)), vec![3, 2, 1]);
    }

    #[test]
    fn test_top_rated_takes_at_most_n() {
        let books: Vec<Book> = (1..=8).map(|i| book(i, "read", 1, i as f64 / 2.0)).collect();
        let top = top_rated(&books, DEFAULT_TOP_RATED);
        assert_eq!(ids(&top), vec![8, 7, 6, 5, 4]);
        assert_eq!(top_rated(&books[..2], DEFAULT_TOP_RATED).len(), 2);
    }

    #[test]
    fn test_top_rated_sorts_nan_last() {
        let books = vec![book(1, "read", 1, f64::NAN), book(2, "read", 1, 0.5)];
        assert_eq!(ids(&top_rated(&books, 2)), vec![2, 1]);
    }
}
