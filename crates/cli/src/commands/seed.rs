//! Seed the catalog from a YAML file.
//!
//! The file is parsed and validated before connecting. Entries whose slug
//! (or publisher name) already exists are skipped, so seeding twice is safe.
//!
//! ```yaml
//! categories:
//!   - name: Fiction
//!   - name: Fantasy
//!     parent: Fiction
//! authors:
//!   - name: Ursula K. Le Guin
//!     bio: American author of speculative fiction.
//! publishers:
//!   - name: Ace Books
//!     website: https://example.com
//! books:
//!   - title: A Wizard of Earthsea
//!     author: Ursula K. Le Guin
//!     category: Fantasy
//!     publisher: Ace Books
//!     genre: FANTASY
//!     format: PAPERBACK
//!     price: 9.99
//!     stock: 12
//!     labels: [B]
//!     description: A young wizard learns the cost of power.
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Deserializer, de::Error as _};
use serde_yaml::Value;
use sqlx::PgPool;
use tracing::{error, info, warn};

use bookbazar_core::{CategoryId, slugify};
use bookbazar_storefront::db::authors::AuthorRepository;
use bookbazar_storefront::db::books::BookRepository;
use bookbazar_storefront::db::categories::CategoryRepository;
use bookbazar_storefront::forms::ProductForm;

use super::{CliError, connect};

/// Book cards show at most this many labels.
const MAX_LABELS: usize = 3;

// =============================================================================
// File Format
// =============================================================================

/// A whole seed file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCatalog {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub authors: Vec<SeedAuthor>,
    #[serde(default)]
    pub publishers: Vec<SeedPublisher>,
    #[serde(default)]
    pub books: Vec<SeedBook>,
}

/// A category; `parent` names a category listed earlier in the file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parent: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedAuthor {
    pub name: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedPublisher {
    pub name: String,
    pub website: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// A book. Text fields take the same values as the staff product form;
/// `category` names a category in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SeedBook {
    #[serde(deserialize_with = "scalar")]
    pub title: String,
    #[serde(deserialize_with = "scalar")]
    pub author: String,
    #[serde(deserialize_with = "scalar")]
    pub additional_authors: String,
    #[serde(deserialize_with = "scalar")]
    pub isbn: String,
    #[serde(deserialize_with = "scalar")]
    pub isbn13: String,
    pub category: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub genre: String,
    #[serde(deserialize_with = "scalar")]
    pub format: String,
    #[serde(deserialize_with = "scalar")]
    pub condition: String,
    #[serde(deserialize_with = "scalar")]
    pub publisher: String,
    #[serde(deserialize_with = "scalar")]
    pub publication_date: String,
    #[serde(deserialize_with = "scalar")]
    pub edition: String,
    #[serde(deserialize_with = "scalar")]
    pub pages: String,
    #[serde(deserialize_with = "scalar")]
    pub language: String,
    #[serde(deserialize_with = "scalar")]
    pub price: String,
    #[serde(deserialize_with = "scalar")]
    pub discount_price: String,
    #[serde(deserialize_with = "scalar")]
    pub stock: String,
    pub featured: bool,
    pub labels: Vec<String>,
    #[serde(deserialize_with = "scalar")]
    pub description: String,
    #[serde(deserialize_with = "scalar")]
    pub excerpt: String,
}

/// Accept strings, numbers, and booleans as text; `null` is blank.
fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a scalar, found {other:?}"))),
    }
}

impl SeedBook {
    /// The product form this entry fills in. The category is resolved
    /// separately because the form takes an id.
    fn to_form(&self) -> ProductForm {
        let label = |i: usize| self.labels.get(i).cloned().unwrap_or_default();
        ProductForm {
            title: self.title.clone(),
            author_name: self.author.clone(),
            additional_authors: self.additional_authors.clone(),
            isbn: self.isbn.clone(),
            isbn13: self.isbn13.clone(),
            category: String::new(),
            genre: self.genre.clone(),
            format: self.format.clone(),
            condition: self.condition.clone(),
            publisher_name: self.publisher.clone(),
            publication_date: self.publication_date.clone(),
            edition: self.edition.clone(),
            pages: self.pages.clone(),
            language: self.language.clone(),
            price: self.price.clone(),
            discount_price: self.discount_price.clone(),
            stock_quantity: self.stock.clone(),
            featured: self.featured.then(|| "on".to_owned()),
            label1: label(0),
            label2: label(1),
            label3: label(2),
            description: self.description.clone(),
            excerpt: self.excerpt.clone(),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Every problem in the file, one line each. Empty means the file is good.
#[must_use]
pub fn validate(catalog: &SeedCatalog) -> Vec<String> {
    let mut problems = Vec::new();

    let mut categories = HashSet::new();
    for (i, category) in catalog.categories.iter().enumerate() {
        let name = category.name.trim();
        if slugify(name).is_empty() {
            problems.push(format!("categories[{i}]: name is required"));
            continue;
        }
        if let Some(parent) = &category.parent
            && !categories.contains(&slugify(parent))
        {
            problems.push(format!(
                "categories[{i}] ({name}): parent {parent:?} must be listed before it"
            ));
        }
        if !categories.insert(slugify(name)) {
            problems.push(format!("categories[{i}] ({name}): duplicate category"));
        }
    }

    for (i, author) in catalog.authors.iter().enumerate() {
        if author.name.trim().is_empty() {
            problems.push(format!("authors[{i}]: name is required"));
        }
    }
    for (i, publisher) in catalog.publishers.iter().enumerate() {
        if publisher.name.trim().is_empty() {
            problems.push(format!("publishers[{i}]: name is required"));
        }
    }

    let mut titles = HashSet::new();
    for (i, book) in catalog.books.iter().enumerate() {
        let title = book.title.trim();
        let at = format!("books[{i}] ({title})");

        if let Err(errors) = book.to_form().validate() {
            for (field, message) in errors.iter() {
                problems.push(format!("{at}: {field}: {message}"));
            }
        }
        if book.labels.len() > MAX_LABELS {
            problems.push(format!("{at}: at most {MAX_LABELS} labels"));
        }
        if let Some(category) = &book.category
            && !categories.contains(&slugify(category))
        {
            problems.push(format!("{at}: unknown category {category:?}"));
        }
        if !title.is_empty() && !titles.insert(slugify(title)) {
            problems.push(format!("{at}: duplicate title"));
        }
    }

    problems
}

// =============================================================================
// Seeding
// =============================================================================

/// Created and skipped counts for one section.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub created: usize,
    pub skipped: usize,
}

impl Tally {
    fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Seed the catalog from `file_path`.
///
/// With `clear`, every book, category, author, and publisher is deleted
/// first. Cart lines, wishlist entries, reviews, and order lines for those
/// books go with them.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database operation fails.
pub async fn run(file_path: &str, clear: bool) -> Result<(), CliError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let catalog: SeedCatalog = serde_yaml::from_str(&content)?;

    info!(
        categories = catalog.categories.len(),
        authors = catalog.authors.len(),
        publishers = catalog.publishers.len(),
        books = catalog.books.len(),
        "Parsed catalog"
    );

    let problems = validate(&catalog);
    if !problems.is_empty() {
        error!("Catalog validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        return Err(CliError::Invalid(problems));
    }
    info!("Catalog validated successfully");

    let pool = connect().await?;

    if clear {
        warn!("Clearing existing catalog");
        clear_catalog(&pool).await?;
    }

    let (categories, category_ids) = seed_categories(&pool, &catalog.categories).await?;
    info!(created = categories.created, skipped = categories.skipped, "Categories seeded");

    let authors = seed_authors(&pool, &catalog.authors).await?;
    info!(created = authors.created, skipped = authors.skipped, "Authors seeded");

    let publishers = seed_publishers(&pool, &catalog.publishers).await?;
    info!(created = publishers.created, skipped = publishers.skipped, "Publishers seeded");

    let books = seed_books(&pool, &catalog.books, &category_ids).await?;
    info!(created = books.created, skipped = books.skipped, "Books seeded");

    info!("Seeding complete!");
    Ok(())
}

async fn clear_catalog(pool: &PgPool) -> Result<(), CliError> {
    let mut tx = pool.begin().await?;
    for table in ["book", "category", "author", "publisher"] {
        let deleted = sqlx::query(&format!("DELETE FROM storefront.{table}"))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        info!(table, deleted, "Cleared");
    }
    tx.commit().await?;
    Ok(())
}

/// Categories in file order, so parents exist before their children.
async fn seed_categories(
    pool: &PgPool,
    entries: &[SeedCategory],
) -> Result<(Tally, HashMap<String, CategoryId>), CliError> {
    let repo = CategoryRepository::new(pool);
    let mut tally = Tally::default();
    let mut ids = HashMap::new();

    for entry in entries {
        let name = entry.name.trim();
        let slug = slugify(name);
        let parent = entry
            .parent
            .as_deref()
            .and_then(|p| ids.get(&slugify(p)).copied());

        let id = match repo.get_by_slug(&slug).await? {
            Some(existing) => {
                tally.record(false);
                existing.id
            }
            None => {
                let created = repo.create(name, entry.description.trim(), parent).await?;
                tally.record(true);
                created.id
            }
        };
        ids.insert(slug, id);
    }

    Ok((tally, ids))
}

async fn seed_authors(pool: &PgPool, entries: &[SeedAuthor]) -> Result<Tally, CliError> {
    let repo = AuthorRepository::new(pool);
    let mut tally = Tally::default();

    for entry in entries {
        let name = entry.name.trim();
        if repo.get_by_slug(&slugify(name)).await?.is_some() {
            tally.record(false);
            continue;
        }
        let id = repo.find_or_create(name).await?;
        let bio = entry.bio.trim();
        if !bio.is_empty() {
            repo.set_bio(id, bio).await?;
        }
        tally.record(true);
    }

    Ok(tally)
}

async fn seed_publishers(pool: &PgPool, entries: &[SeedPublisher]) -> Result<Tally, CliError> {
    let repo = AuthorRepository::new(pool);
    let mut tally = Tally::default();

    for entry in entries {
        let name = entry.name.trim();
        if repo.get_publisher_by_name(name).await?.is_some() {
            tally.record(false);
            continue;
        }
        let id = repo.find_or_create_publisher(name).await?;
        repo.set_publisher_details(id, entry.website.as_deref(), entry.description.trim())
            .await?;
        tally.record(true);
    }

    Ok(tally)
}

/// Books, resolving author and publisher names the way the product form does.
async fn seed_books(
    pool: &PgPool,
    entries: &[SeedBook],
    category_ids: &HashMap<String, CategoryId>,
) -> Result<Tally, CliError> {
    let books = BookRepository::new(pool);
    let authors = AuthorRepository::new(pool);
    let mut tally = Tally::default();

    for entry in entries {
        if books.get_by_slug(&slugify(&entry.title)).await?.is_some() {
            tally.record(false);
            continue;
        }

        let mut data = entry.to_form().validate().map_err(|errors| {
            CliError::Invalid(
                errors
                    .iter()
                    .map(|(field, message)| format!("{}: {field}: {message}", entry.title))
                    .collect(),
            )
        })?;
        data.book.category_id = entry
            .category
            .as_deref()
            .and_then(|c| category_ids.get(&slugify(c)).copied());
        data.book.author_id = Some(authors.find_or_create(&data.author_name).await?);
        data.book.publisher_id = match data.publisher_name.as_deref() {
            Some(name) => Some(authors.find_or_create_publisher(name).await?),
            None => None,
        };

        let book = books.create(&data.book).await?;
        info!(slug = %book.slug, "Created book");
        tally.record(true);
    }

    Ok(tally)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r"
categories:
  - name: Fiction
  - name: Fantasy
    parent: Fiction
    description: Dragons and wizards.
authors:
  - name: Ursula K. Le Guin
publishers:
  - name: Ace Books
books:
  - title: A Wizard of Earthsea
    author: Ursula K. Le Guin
    category: Fantasy
    publisher: Ace Books
    genre: FANTASY
    price: 9.99
    discount_price: 7.5
    stock: 12
    featured: true
    labels: [B, N]
    isbn13: 978-0-547-77374-3
    description: A young wizard learns the cost of power.
";

    #[test]
    fn test_valid_catalog_has_no_problems() {
        let catalog: SeedCatalog = serde_yaml::from_str(CATALOG).unwrap();
        assert_eq!(catalog.categories.len(), 2);
        assert!(validate(&catalog).is_empty(), "{:?}", validate(&catalog));
    }

    #[test]
    fn test_numbers_become_form_text() {
        let catalog: SeedCatalog = serde_yaml::from_str(CATALOG).unwrap();
        let form = catalog.books[0].to_form();
        assert_eq!(form.price, "9.99");
        assert_eq!(form.stock_quantity, "12");
        assert_eq!(form.label1, "B");
        assert_eq!(form.label3, "");
        assert!(form.is_featured());

        let data = form.validate().unwrap();
        assert_eq!(data.book.stock_quantity, 12);
        assert_eq!(data.book.isbn13.as_deref(), Some("9780547773743"));
    }

    #[test]
    fn test_parent_must_come_first() {
        let catalog: SeedCatalog = serde_yaml::from_str(
            "categories:\n  - name: Fantasy\n    parent: Fiction\n  - name: Fiction\n",
        )
        .unwrap();
        let problems = validate(&catalog);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("must be listed before it"));
    }

    #[test]
    fn test_book_problems_are_collected() {
        let catalog: SeedCatalog = serde_yaml::from_str(
            r"
books:
  - title: Dune
    author: Frank Herbert
    category: Science Fiction
    price: 0
    labels: [N, B, S, P]
    description: Spice and sand on Arrakis.
  - title: Dune
    author: Frank Herbert
    price: 10
    description: Spice and sand on Arrakis.
",
        )
        .unwrap();
        let problems = validate(&catalog);
        assert!(problems.iter().any(|p| p.contains("price: Price must be greater than 0.")));
        assert!(problems.iter().any(|p| p.contains("at most 3 labels")));
        assert!(problems.iter().any(|p| p.contains("unknown category")));
        assert!(problems.iter().any(|p| p.contains("duplicate title")));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = serde_yaml::from_str::<SeedCatalog>("books:\n  - title: Dune\n    colour: red\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_tally() {
        let mut tally = Tally::default();
        tally.record(true);
        tally.record(false);
        tally.record(true);
        assert_eq!(tally, Tally { created: 2, skipped: 1 });
    }
}
