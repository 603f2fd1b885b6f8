//! Deterministic demo data served when the provider cannot be used.
//!
//! Generation has no external dependency, so it is the terminal fallback of
//! every search path.

use lens_commerce::{Currency, Money, ShoppingResult};

struct Template {
    suffix: &'static str,
    source: &'static str,
    price: f64,
    rating: Option<f64>,
    reviews: Option<u32>,
}

const BOOK_TEMPLATES: [Template; 3] = [
    Template {
        suffix: "First Edition",
        source: "Book Depository",
        price: 21.99,
        rating: Some(4.6),
        reviews: Some(312),
    },
    Template {
        suffix: "Paperback",
        source: "Barnes & Noble",
        price: 14.95,
        rating: Some(4.4),
        reviews: Some(1045),
    },
    Template {
        suffix: "Hardcover Special Edition",
        source: "Amazon",
        price: 29.99,
        rating: Some(4.8),
        reviews: Some(87),
    },
];

const GENERAL_TEMPLATES: [Template; 5] = [
    Template {
        suffix: "Premium Collection (Mock Data)",
        source: "Example Store",
        price: 24.99,
        rating: Some(4.5),
        reviews: Some(120),
    },
    Template {
        suffix: "Deluxe Set (Mock Data)",
        source: "Book Store",
        price: 34.99,
        rating: Some(4.2),
        reviews: Some(85),
    },
    Template {
        suffix: "Special Edition (Mock Data)",
        source: "Vintage Shop",
        price: 129.99,
        rating: Some(4.7),
        reviews: Some(68),
    },
    Template {
        suffix: "Budget Option (Mock Data)",
        source: "Discount Store",
        price: 19.99,
        rating: Some(3.9),
        reviews: Some(220),
    },
    Template {
        suffix: "Limited Edition (Mock Data)",
        source: "Collector's Market",
        price: 149.99,
        rating: None,
        reviews: None,
    },
];

const LENS_TEMPLATES: [(&str, &str, f64); 3] = [
    ("Closest Match (Mock Data)", "Example Store", 39.99),
    ("Alternative (Mock Data)", "Another Store", 27.50),
    ("Budget Pick (Mock Data)", "Value Shop", 15.99),
];

fn delivery(slot: usize) -> &'static str {
    if slot % 2 == 0 {
        "Free shipping"
    } else {
        "$4.99 shipping"
    }
}

/// Whether a query should use the book parameter set and book demo data:
/// any case-insensitive occurrence of "book", including "Cookbook".
pub fn is_book_query(query: &str) -> bool {
    query.to_lowercase().contains("book")
}

/// Demo shopping results for `query`.
pub fn shopping_results(query: &str, is_book: bool) -> Vec<ShoppingResult> {
    let (templates, link_stem): (&[Template], &str) = if is_book {
        (&BOOK_TEMPLATES, "book")
    } else {
        (&GENERAL_TEMPLATES, "product")
    };

    templates
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let n = i + 1;
            ShoppingResult {
                position: n as u32,
                title: format!("{} - {}", query, t.suffix),
                link: format!("https://example.com/{}{}", link_stem, n),
                source: t.source.to_string(),
                price: Money::from_decimal(t.price, Currency::USD).display(),
                extracted_price: t.price,
                thumbnail_url: format!("https://picsum.photos/200/30{}", i),
                delivery_text: delivery(i).to_string(),
                rating: t.rating,
                review_count: t.reviews,
            }
        })
        .collect()
}

/// Demo visual matches for `query`.
pub fn lens_matches(query: &str) -> Vec<ShoppingResult> {
    LENS_TEMPLATES
        .iter()
        .enumerate()
        .map(|(i, (title, source, price))| ShoppingResult {
            position: i as u32 + 1,
            title: format!("{} - {}", query, title),
            link: format!("https://example.com/product{}", i + 1),
            source: source.to_string(),
            price: Money::from_decimal(*price, Currency::USD).display(),
            extracted_price: *price,
            thumbnail_url: format!("https://picsum.photos/200/30{}", i),
            delivery_text: delivery(i).to_string(),
            rating: None,
            review_count: None,
        })
        .collect()
}
