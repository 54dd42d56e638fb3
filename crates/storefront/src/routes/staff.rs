//! Staff catalog management: books with their gallery, author pages and
//! categories.
//!
//! Every handler here takes [`RequireStaff`]. Book and author forms are
//! multipart so images can ride along with the fields.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use bookbazar_core::{BookCondition, BookFormat, BookImageId, BookLabel, Genre};

use crate::db::RepositoryError;
use crate::db::authors::AuthorRepository;
use crate::db::book_images::{BookImageRepository, MAX_GALLERY_IMAGES};
use crate::db::books::BookRepository;
use crate::db::categories::CategoryRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{
    AuthorForm, CategoryForm, FieldErrors, ProductForm,
    catalog::{ProductData, gallery_caption},
};
use crate::middleware::{Layout, PageContext, RequireStaff};
use crate::models::{Author, Book, BookImage, Category, FlashLevel};
use crate::routes::products::book_or_404;
use crate::routes::upload::{UploadedFile, read_multipart};
use crate::routes::views::{ChoiceView, choice_options};
use crate::services::uploads::{MediaKind, validate_image};

// =============================================================================
// View Types
// =============================================================================

/// A category `<option>`; ids are only known at runtime.
#[derive(Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

fn category_options(categories: &[Category], selected: &str) -> Vec<CategoryOption> {
    let selected = selected.trim();
    categories
        .iter()
        .map(|c| {
            let id = c.id.to_string();
            CategoryOption {
                selected: id == selected,
                id,
                name: c.name.clone(),
            }
        })
        .collect()
}

/// A gallery image on the edit page, with its management actions.
pub struct GalleryImageView {
    pub url: String,
    pub caption: String,
    pub is_primary: bool,
    pub primary_action: String,
    pub delete_action: String,
}

fn gallery_views(slug: &str, images: &[BookImage]) -> Vec<GalleryImageView> {
    images
        .iter()
        .map(|image| GalleryImageView {
            url: image.image.clone(),
            caption: image.caption.clone(),
            is_primary: image.is_primary,
            primary_action: format!("/edit-product/{slug}/images/{}/primary", image.id),
            delete_action: format!("/edit-product/{slug}/images/{}/delete", image.id),
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Add/edit book page.
#[derive(Template, WebTemplate)]
#[template(path = "staff/product_form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub heading: &'static str,
    pub action: String,
    pub form: ProductForm,
    pub errors: FieldErrors,
    pub cover_url: Option<String>,
    pub gallery: Vec<GalleryImageView>,
    pub gallery_caption: String,
    pub max_gallery_images: i64,
    pub categories: Vec<CategoryOption>,
    pub genres: Vec<ChoiceView>,
    pub formats: Vec<ChoiceView>,
    pub conditions: Vec<ChoiceView>,
    pub label_options: [Vec<ChoiceView>; 3],
}

/// Staff author page.
#[derive(Template, WebTemplate)]
#[template(path = "staff/author_form.html")]
pub struct AuthorFormTemplate {
    pub layout: Layout,
    pub name: String,
    pub action: String,
    pub form: AuthorForm,
    pub errors: FieldErrors,
    pub photo_url: Option<String>,
}

/// Add category page.
#[derive(Template, WebTemplate)]
#[template(path = "staff/category_form.html")]
pub struct CategoryFormTemplate {
    pub layout: Layout,
    pub form: CategoryForm,
    pub errors: FieldErrors,
    pub parents: Vec<CategoryOption>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Where a product form posts and what it is called.
enum ProductPage<'a> {
    Add,
    Edit(&'a Book),
}

impl ProductPage<'_> {
    fn heading(&self) -> &'static str {
        match self {
            Self::Add => "Add Book",
            Self::Edit(_) => "Edit Book",
        }
    }

    fn action(&self) -> String {
        match self {
            Self::Add => "/add-product".to_owned(),
            Self::Edit(book) => format!("/edit-product/{}", book.slug),
        }
    }

    fn cover_url(&self) -> Option<String> {
        match self {
            Self::Add => None,
            Self::Edit(book) => book.cover_image.clone(),
        }
    }

    async fn gallery(&self, ctx: &PageContext) -> Result<Vec<BookImage>> {
        match self {
            Self::Add => Ok(Vec::new()),
            Self::Edit(book) => Ok(BookImageRepository::new(ctx.state.pool())
                .list(book.id)
                .await?),
        }
    }
}

/// The multipart body of a book form.
#[derive(Default)]
struct ProductSubmission {
    form: ProductForm,
    caption: String,
    cover: Option<UploadedFile>,
    gallery: Vec<UploadedFile>,
}

async fn read_product(multipart: Multipart) -> Result<ProductSubmission> {
    let mut form = ProductForm::default();
    let mut caption = String::new();
    let mut files = read_multipart(multipart, |name, value| {
        if name == "gallery_caption" {
            caption = value;
        } else {
            form.set(name, value);
        }
    })
    .await?;
    Ok(ProductSubmission {
        cover: files.take("cover_image"),
        gallery: files.take_all("gallery_image"),
        form,
        caption,
    })
}

async fn render_product_form(
    ctx: &PageContext,
    page: &ProductPage<'_>,
    form: ProductForm,
    caption: String,
    errors: FieldErrors,
) -> Result<Response> {
    let categories = CategoryRepository::new(ctx.state.pool()).list().await?;
    let gallery = match page {
        ProductPage::Add => Vec::new(),
        ProductPage::Edit(book) => gallery_views(&book.slug, &page.gallery(ctx).await?),
    };
    let labels = |selected: &str| {
        choice_options(
            BookLabel::ALL.iter().map(|l| (l.as_str(), l.label())),
            selected,
        )
    };

    Ok(ProductFormTemplate {
        heading: page.heading(),
        action: page.action(),
        cover_url: page.cover_url(),
        gallery,
        gallery_caption: caption,
        max_gallery_images: MAX_GALLERY_IMAGES,
        categories: category_options(&categories, &form.category),
        genres: choice_options(Genre::ALL.iter().map(|g| (g.as_str(), g.label())), &form.genre),
        formats: choice_options(
            BookFormat::ALL.iter().map(|f| (f.as_str(), f.label())),
            &form.format,
        ),
        conditions: choice_options(
            BookCondition::ALL.iter().map(|c| (c.as_str(), c.label())),
            &form.condition,
        ),
        label_options: [labels(&form.label1), labels(&form.label2), labels(&form.label3)],
        form,
        errors,
        layout: ctx.layout().await,
    }
    .into_response())
}

/// Validate the form, the category reference and the uploads together.
///
/// `gallery_size` is how many images the book already has.
async fn check_product(
    ctx: &PageContext,
    submission: &ProductSubmission,
    gallery_size: usize,
) -> Result<std::result::Result<ProductData, FieldErrors>> {
    let (data, mut errors) = match submission.form.validate() {
        Ok(data) => (Some(data), FieldErrors::new()),
        Err(errors) => (None, errors),
    };
    if let Some(category) = data.as_ref().and_then(|d| d.book.category_id)
        && !CategoryRepository::new(ctx.state.pool())
            .exists(category)
            .await?
    {
        errors.add("category", "Select a valid choice.");
    }
    if let Some(cover) = &submission.cover
        && let Err(err) = validate_image(&cover.filename, cover.bytes.len())
    {
        errors.add("cover_image", err.to_string());
    }
    check_gallery(&mut errors, submission, gallery_size);
    Ok(data.filter(|_| errors.is_empty()).ok_or(errors))
}

fn check_gallery(errors: &mut FieldErrors, submission: &ProductSubmission, gallery_size: usize) {
    if let Err(message) = gallery_caption(&submission.caption) {
        errors.add("gallery_caption", message);
    }
    let room = usize::try_from(MAX_GALLERY_IMAGES)
        .unwrap_or(usize::MAX)
        .saturating_sub(gallery_size);
    if submission.gallery.len() > room {
        errors.add(
            "gallery_image",
            format!("A book can have at most {MAX_GALLERY_IMAGES} gallery images."),
        );
    }
    if let Some(err) = submission
        .gallery
        .iter()
        .find_map(|image| validate_image(&image.filename, image.bytes.len()).err())
    {
        errors.add("gallery_image", err.to_string());
    }
}

/// Resolve author and publisher names to ids.
async fn resolve_people(ctx: &PageContext, data: &mut ProductData) -> Result<()> {
    let authors = AuthorRepository::new(ctx.state.pool());
    data.book.author_id = Some(authors.find_or_create(&data.author_name).await?);
    data.book.publisher_id = match &data.publisher_name {
        Some(name) => Some(authors.find_or_create_publisher(name).await?),
        None => None,
    };
    Ok(())
}

async fn store_cover(ctx: &PageContext, cover: Option<UploadedFile>) -> Result<Option<String>> {
    match cover {
        Some(cover) => Ok(Some(
            ctx.state
                .media()
                .save_image(MediaKind::BookCover, &cover.filename, &cover.bytes)
                .await?,
        )),
        None => Ok(None),
    }
}

/// Store new gallery images under the book. Files are removed again if
/// the gallery filled up in the meantime.
async fn store_gallery(
    ctx: &PageContext,
    book: &Book,
    gallery: Vec<UploadedFile>,
    caption: &str,
) -> Result<()> {
    if gallery.is_empty() {
        return Ok(());
    }
    let media = ctx.state.media();
    let mut paths = Vec::with_capacity(gallery.len());
    for image in gallery {
        paths.push(
            media
                .save_image(MediaKind::BookImage, &image.filename, &image.bytes)
                .await?,
        );
    }

    match BookImageRepository::new(ctx.state.pool())
        .add(book.id, &paths, caption.trim())
        .await
    {
        Ok(added) => {
            tracing::info!(book_id = %book.id, count = added.len(), "Gallery images added");
            Ok(())
        }
        Err(RepositoryError::Conflict(reason)) => {
            for path in &paths {
                media.remove(path).await;
            }
            tracing::warn!(book_id = %book.id, %reason, "Gallery images rejected");
            ctx.flash(
                FlashLevel::Warning,
                format!("The gallery is full; at most {MAX_GALLERY_IMAGES} images are kept."),
            )
            .await;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn isbn_conflict() -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add(FieldErrors::FORM, "A book with this ISBN already exists.");
    errors
}

// =============================================================================
// Product Routes
// =============================================================================

/// Empty add-book form.
#[instrument(skip(ctx, _staff))]
pub async fn add_product_page(ctx: PageContext, _staff: RequireStaff) -> Result<Response> {
    let form = ProductForm {
        format: BookFormat::Paperback.as_str().to_owned(),
        condition: BookCondition::New.as_str().to_owned(),
        language: "English".to_owned(),
        stock_quantity: "1".to_owned(),
        ..ProductForm::default()
    };
    render_product_form(&ctx, &ProductPage::Add, form, String::new(), FieldErrors::new()).await
}

/// Create a book.
#[instrument(skip(ctx, staff, multipart), fields(user_id = %staff.0.id))]
pub async fn add_product(
    ctx: PageContext,
    staff: RequireStaff,
    multipart: Multipart,
) -> Result<Response> {
    let mut submission = read_product(multipart).await?;

    let mut data = match check_product(&ctx, &submission, 0).await? {
        Ok(data) => data,
        Err(errors) => {
            return render_product_form(
                &ctx,
                &ProductPage::Add,
                submission.form,
                submission.caption,
                errors,
            )
            .await;
        }
    };
    resolve_people(&ctx, &mut data).await?;
    data.book.cover_image = store_cover(&ctx, submission.cover.take()).await?;

    let book = match BookRepository::new(ctx.state.pool()).create(&data.book).await {
        Ok(book) => book,
        Err(RepositoryError::Conflict(_)) => {
            if let Some(path) = &data.book.cover_image {
                ctx.state.media().remove(path).await;
            }
            return render_product_form(
                &ctx,
                &ProductPage::Add,
                submission.form,
                submission.caption,
                isbn_conflict(),
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    };
    store_gallery(&ctx, &book, submission.gallery, &submission.caption).await?;
    ctx.state.catalog().invalidate().await;

    tracing::info!(book_id = %book.id, slug = %book.slug, "Book added");
    ctx.flash(FlashLevel::Success, "Book added successfully!")
        .await;
    Ok(Redirect::to(&format!("/product/{}", book.slug)).into_response())
}

/// Pre-filled edit form.
#[instrument(skip(ctx, _staff))]
pub async fn edit_product_page(
    ctx: PageContext,
    _staff: RequireStaff,
    Path(slug): Path<String>,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;
    let form = ProductForm::from_book(&book);
    render_product_form(
        &ctx,
        &ProductPage::Edit(&book),
        form,
        String::new(),
        FieldErrors::new(),
    )
    .await
}

/// Update a book. The slug is kept so existing links stay valid.
#[instrument(skip(ctx, staff, multipart), fields(user_id = %staff.0.id))]
pub async fn edit_product(
    ctx: PageContext,
    staff: RequireStaff,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;
    let page = ProductPage::Edit(&book);

    let mut submission = read_product(multipart).await?;
    let gallery_size = page.gallery(&ctx).await?.len();

    let mut data = match check_product(&ctx, &submission, gallery_size).await? {
        Ok(data) => data,
        Err(errors) => {
            return render_product_form(&ctx, &page, submission.form, submission.caption, errors).await;
        }
    };
    resolve_people(&ctx, &mut data).await?;
    let new_cover = store_cover(&ctx, submission.cover.take()).await?;
    data.book.cover_image = new_cover.clone().or_else(|| book.cover_image.clone());

    let media = ctx.state.media();
    let updated = match BookRepository::new(ctx.state.pool())
        .update(book.id, &data.book)
        .await
    {
        Ok(updated) => updated,
        Err(RepositoryError::Conflict(_)) => {
            if let Some(path) = &new_cover {
                media.remove(path).await;
            }
            return render_product_form(
                &ctx,
                &page,
                submission.form,
                submission.caption,
                isbn_conflict(),
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    };
    if new_cover.is_some()
        && let Some(old) = &book.cover_image
    {
        media.remove(old).await;
    }
    store_gallery(&ctx, &updated, submission.gallery, &submission.caption).await?;
    ctx.state.catalog().invalidate().await;

    tracing::info!(book_id = %updated.id, "Book updated");
    ctx.flash(FlashLevel::Success, "Book updated successfully!")
        .await;
    Ok(Redirect::to(&format!("/product/{}", updated.slug)).into_response())
}

/// Delete a book with its cover and gallery.
#[instrument(skip(ctx, staff), fields(user_id = %staff.0.id))]
pub async fn delete_product(
    ctx: PageContext,
    staff: RequireStaff,
    Path(slug): Path<String>,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;
    let gallery = BookImageRepository::new(ctx.state.pool())
        .list(book.id)
        .await?;

    BookRepository::new(ctx.state.pool()).delete(book.id).await?;
    let media = ctx.state.media();
    for path in book.cover_image.iter().chain(gallery.iter().map(|i| &i.image)) {
        media.remove(path).await;
    }
    ctx.state.catalog().invalidate().await;

    tracing::info!(book_id = %book.id, "Book deleted");
    ctx.flash(
        FlashLevel::Success,
        format!("Book \"{}\" deleted successfully!", book.title),
    )
    .await;
    Ok(Redirect::to("/").into_response())
}

/// Make a gallery image the book's primary one.
#[instrument(skip(ctx, staff), fields(user_id = %staff.0.id))]
pub async fn make_primary_image(
    ctx: PageContext,
    staff: RequireStaff,
    Path((slug, image)): Path<(String, i32)>,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;
    BookImageRepository::new(ctx.state.pool())
        .set_primary(book.id, BookImageId::new(image))
        .await?;
    ctx.state.catalog().invalidate().await;

    tracing::info!(book_id = %book.id, image, "Primary gallery image changed");
    ctx.flash(FlashLevel::Success, "Primary image updated.").await;
    Ok(Redirect::to(&format!("/edit-product/{slug}")).into_response())
}

/// Delete one gallery image.
#[instrument(skip(ctx, staff), fields(user_id = %staff.0.id))]
pub async fn delete_image(
    ctx: PageContext,
    staff: RequireStaff,
    Path((slug, image)): Path<(String, i32)>,
) -> Result<Response> {
    let book = book_or_404(&ctx, &slug).await?;
    let path = BookImageRepository::new(ctx.state.pool())
        .delete(book.id, BookImageId::new(image))
        .await?;
    ctx.state.media().remove(&path).await;
    ctx.state.catalog().invalidate().await;

    tracing::info!(book_id = %book.id, image, "Gallery image deleted");
    ctx.flash(FlashLevel::Success, "Image deleted.").await;
    Ok(Redirect::to(&format!("/edit-product/{slug}")).into_response())
}

// =============================================================================
// Author Routes
// =============================================================================

async fn author_or_404(ctx: &PageContext, slug: &str) -> Result<Author> {
    AuthorRepository::new(ctx.state.pool())
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("author {slug}")))
}

fn render_author_form(
    layout: Layout,
    author: &Author,
    form: AuthorForm,
    errors: FieldErrors,
) -> Response {
    AuthorFormTemplate {
        layout,
        name: author.name.clone(),
        action: format!("/edit-author/{}", author.slug),
        form,
        errors,
        photo_url: author.image.clone(),
    }
    .into_response()
}

/// Author biography and photo form.
#[instrument(skip(ctx, _staff))]
pub async fn edit_author_page(
    ctx: PageContext,
    _staff: RequireStaff,
    Path(slug): Path<String>,
) -> Result<Response> {
    let author = author_or_404(&ctx, &slug).await?;
    let form = AuthorForm {
        bio: author.bio.clone(),
        remove_photo: None,
    };
    Ok(render_author_form(ctx.layout().await, &author, form, FieldErrors::new()))
}

/// Save an author's biography and photo.
#[instrument(skip(ctx, staff, multipart), fields(user_id = %staff.0.id))]
pub async fn edit_author(
    ctx: PageContext,
    staff: RequireStaff,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let author = author_or_404(&ctx, &slug).await?;

    let mut form = AuthorForm::default();
    let photo = read_multipart(multipart, |name, value| form.set(name, value))
        .await?
        .take("photo");
    if let Some(photo) = &photo
        && let Err(err) = validate_image(&photo.filename, photo.bytes.len())
    {
        let mut errors = FieldErrors::new();
        errors.add("photo", err.to_string());
        return Ok(render_author_form(ctx.layout().await, &author, form, errors));
    }

    let authors = AuthorRepository::new(ctx.state.pool());
    let media = ctx.state.media();
    authors.set_bio(author.id, form.bio.trim()).await?;

    let replaced = match photo {
        Some(photo) => {
            let path = media
                .save_image(MediaKind::AuthorPhoto, &photo.filename, &photo.bytes)
                .await?;
            authors.set_image(author.id, Some(&path)).await?;
            true
        }
        None if form.removes_photo() => {
            authors.set_image(author.id, None).await?;
            true
        }
        None => false,
    };
    if replaced && let Some(old) = &author.image {
        media.remove(old).await;
    }

    tracing::info!(author_id = %author.id, photo_changed = replaced, "Author updated");
    ctx.flash(FlashLevel::Success, "Author updated successfully!")
        .await;
    Ok(Redirect::to(&format!("/authors/{slug}")).into_response())
}

// =============================================================================
// Category Routes
// =============================================================================

async fn render_category_form(
    ctx: &PageContext,
    form: CategoryForm,
    errors: FieldErrors,
) -> Result<Response> {
    let categories = CategoryRepository::new(ctx.state.pool()).list().await?;
    Ok(CategoryFormTemplate {
        parents: category_options(&categories, &form.parent),
        form,
        errors,
        layout: ctx.layout().await,
    }
    .into_response())
}

/// Empty add-category form.
#[instrument(skip(ctx, _staff))]
pub async fn add_category_page(ctx: PageContext, _staff: RequireStaff) -> Result<Response> {
    render_category_form(&ctx, CategoryForm::default(), FieldErrors::new()).await
}

/// Create a category.
#[instrument(skip(ctx, staff, form), fields(user_id = %staff.0.id))]
pub async fn add_category(
    ctx: PageContext,
    staff: RequireStaff,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let categories = CategoryRepository::new(ctx.state.pool());

    let data = match form.validate() {
        Ok(data) => data,
        Err(errors) => return render_category_form(&ctx, form, errors).await,
    };
    if let Some(parent) = data.parent
        && !categories.exists(parent).await?
    {
        let mut errors = FieldErrors::new();
        errors.add("parent", "Select a valid choice.");
        return render_category_form(&ctx, form, errors).await;
    }

    let category = match categories
        .create(&data.name, &data.description, data.parent)
        .await
    {
        Ok(category) => category,
        Err(RepositoryError::Conflict(_)) => {
            let mut errors = FieldErrors::new();
            errors.add("name", "Category with this Name already exists.");
            return render_category_form(&ctx, form, errors).await;
        }
        Err(err) => return Err(err.into()),
    };
    ctx.state.catalog().invalidate().await;

    tracing::info!(category_id = %category.id, "Category added");
    ctx.flash(FlashLevel::Success, "Category added successfully!")
        .await;
    Ok(Redirect::to(&format!("/categories/{}", category.slug)).into_response())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use bookbazar_core::CategoryId;

    use super::*;

    fn category(id: i32, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_owned(),
            slug: name.to_lowercase(),
            description: String::new(),
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_category_options_select_by_id() {
        let options = category_options(&[category(1, "Fiction"), category(2, "History")], "2");
        assert!(!options[0].selected);
        assert!(options[1].selected);
        assert_eq!(options[1].name, "History");
    }

    #[test]
    fn test_gallery_views_link_to_image_actions() {
        let images = [BookImage {
            id: BookImageId::new(7),
            book_id: bookbazar_core::BookId::new(3),
            image: "/media/book_images/a.jpg".to_owned(),
            caption: "Spine".to_owned(),
            is_primary: true,
            created_at: Utc::now(),
        }];
        let views = gallery_views("dune", &images);
        assert_eq!(views[0].primary_action, "/edit-product/dune/images/7/primary");
        assert_eq!(views[0].delete_action, "/edit-product/dune/images/7/delete");
        assert!(views[0].is_primary);
    }

    #[test]
    fn test_gallery_upload_limits() {
        let image = |name: &str| UploadedFile {
            filename: name.to_owned(),
            bytes: axum::body::Bytes::from_static(b"img"),
        };
        let submission = ProductSubmission {
            gallery: vec![image("a.jpg"), image("b.png")],
            ..ProductSubmission::default()
        };

        let mut errors = FieldErrors::new();
        check_gallery(&mut errors, &submission, 6);
        assert!(!errors.has("gallery_image"));

        let mut errors = FieldErrors::new();
        check_gallery(&mut errors, &submission, 7);
        assert_eq!(
            errors.get("gallery_image"),
            Some("A book can have at most 8 gallery images.")
        );

        let bad = ProductSubmission {
            gallery: vec![image("scan.pdf")],
            caption: "x".repeat(201),
            ..ProductSubmission::default()
        };
        let mut errors = FieldErrors::new();
        check_gallery(&mut errors, &bad, 0);
        assert!(errors.has("gallery_image"));
        assert_eq!(
            errors.get("gallery_caption"),
            Some("Caption must be at most 200 characters.")
        );
    }

    #[test]
    fn test_product_page_targets() {
        assert_eq!(ProductPage::Add.action(), "/add-product");
        assert_eq!(ProductPage::Add.heading(), "Add Book");
    }
}
