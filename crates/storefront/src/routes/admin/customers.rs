//! Customer addresses, profiles and wishlists.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    body::Bytes,
    extract::Query,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use bookbazar_core::{AddressId, Email, UserId, WishlistItemId};

use crate::db::addresses::{AddressAction, AddressRepository, AddressWithOwner};
use crate::db::profiles::{ProfileAction, ProfileRepository, ProfileWithEmail};
use crate::db::wishlists::{WishlistOverview, WishlistRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::{Layout, PageContext, RequireStaff};
use crate::models::FlashLevel;

use super::catalog::SearchQuery;
use super::{DATE_FORMAT, parse_bulk};

// =============================================================================
// View Types
// =============================================================================

/// One wishlist entry: who wants which book, and whether it can be sold.
pub struct AdminWishlistRow {
    pub id: WishlistItemId,
    pub email: String,
    pub slug: String,
    pub book: String,
    pub price: String,
    pub availability: &'static str,
    pub added: String,
}

impl From<&WishlistOverview> for AdminWishlistRow {
    fn from(entry: &WishlistOverview) -> Self {
        let book = match &entry.author_name {
            Some(author) => format!("{} by {author}", entry.title),
            None => entry.title.clone(),
        };
        Self {
            id: entry.id,
            email: entry.user_email.clone(),
            slug: entry.slug.clone(),
            book,
            price: entry.price.to_string(),
            availability: if entry.is_available { "Available" } else { "Unavailable" },
            added: entry.added_date.format(DATE_FORMAT).to_string(),
        }
    }
}

pub struct AdminAddressRow {
    pub id: AddressId,
    pub email: String,
    pub line: String,
    pub kind: &'static str,
    pub is_default: bool,
}

impl From<&AddressWithOwner> for AdminAddressRow {
    fn from(row: &AddressWithOwner) -> Self {
        Self {
            id: row.address.id,
            email: row.user_email.clone(),
            line: row.address.one_line(),
            kind: row.address.address_type.label(),
            is_default: row.address.is_default,
        }
    }
}

pub struct AdminProfileRow {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub newsletter: bool,
    pub one_click: bool,
    pub has_photo: bool,
}

impl From<&ProfileWithEmail> for AdminProfileRow {
    fn from(row: &ProfileWithEmail) -> Self {
        let profile = &row.profile;
        let name = Email::parse(&row.email)
            .map(|email| profile.full_name(&email))
            .unwrap_or_else(|_| row.email.clone());
        Self {
            user_id: profile.user_id,
            email: row.email.clone(),
            name,
            phone: profile.phone.clone().unwrap_or_default(),
            newsletter: profile.newsletter,
            one_click: profile.one_click_customer().is_some(),
            has_photo: profile.profile_photo.is_some(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "admin/addresses.html")]
pub struct AddressesTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub addresses: Vec<AdminAddressRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/profiles.html")]
pub struct ProfilesTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub profiles: Vec<AdminProfileRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/wishlists.html")]
pub struct WishlistsTemplate {
    pub layout: Layout,
    pub current_path: &'static str,
    pub query: String,
    pub entries: Vec<AdminWishlistRow>,
}

fn address_message(action: AddressAction, n: u64) -> String {
    match action {
        AddressAction::SetDefault => format!("{n} addresses set as default."),
        AddressAction::UnsetDefault => format!("{n} addresses unset as default."),
    }
}

fn profile_message(action: ProfileAction, n: u64) -> String {
    match action {
        ProfileAction::EnableNewsletter => format!("Enabled newsletter for {n} profiles."),
        ProfileAction::DisableNewsletter => format!("Disabled newsletter for {n} profiles."),
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Every saved address with its owner.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn addresses(ctx: PageContext, staff: RequireStaff) -> Result<impl IntoResponse> {
    let rows = AddressRepository::new(ctx.state.pool()).admin_list().await?;
    Ok(AddressesTemplate {
        current_path: "/admin/addresses",
        addresses: rows.iter().map(AdminAddressRow::from).collect(),
        layout: ctx.layout().await,
    })
}

/// Set or unset the default flag on the ticked addresses.
#[instrument(skip(ctx, staff, body), fields(staff_id = %staff.0.id))]
pub async fn address_actions(
    ctx: PageContext,
    staff: RequireStaff,
    body: Bytes,
) -> Result<Response> {
    if let Some(bulk) = parse_bulk::<AddressAction>(&ctx, &body).await {
        let n = AddressRepository::new(ctx.state.pool())
            .apply_action(bulk.action, &bulk.ids)
            .await?;
        ctx.flash(FlashLevel::Success, address_message(bulk.action, n))
            .await;
    }
    Ok(Redirect::to("/admin/addresses").into_response())
}

/// Every customer profile.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn profiles(ctx: PageContext, staff: RequireStaff) -> Result<impl IntoResponse> {
    let rows = ProfileRepository::new(ctx.state.pool()).admin_list().await?;
    Ok(ProfilesTemplate {
        current_path: "/admin/profiles",
        profiles: rows.iter().map(AdminProfileRow::from).collect(),
        layout: ctx.layout().await,
    })
}

/// Toggle the newsletter preference on the ticked profiles.
#[instrument(skip(ctx, staff, body), fields(staff_id = %staff.0.id))]
pub async fn profile_actions(
    ctx: PageContext,
    staff: RequireStaff,
    body: Bytes,
) -> Result<Response> {
    if let Some(bulk) = parse_bulk::<ProfileAction>(&ctx, &body).await {
        let n = ProfileRepository::new(ctx.state.pool())
            .apply_action(bulk.action, &bulk.ids)
            .await?;
        ctx.flash(FlashLevel::Success, profile_message(bulk.action, n))
            .await;
    }
    Ok(Redirect::to("/admin/profiles").into_response())
}

/// Every wishlist entry, newest first, searchable by email, title or author.
#[instrument(skip(ctx, staff), fields(staff_id = %staff.0.id))]
pub async fn wishlists(
    ctx: PageContext,
    staff: RequireStaff,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let q = query.q.unwrap_or_default();
    let rows = WishlistRepository::new(ctx.state.pool())
        .admin_list(&q)
        .await?;
    Ok(WishlistsTemplate {
        current_path: "/admin/wishlists",
        query: q,
        entries: rows.iter().map(AdminWishlistRow::from).collect(),
        layout: ctx.layout().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            address_message(AddressAction::UnsetDefault, 2),
            "2 addresses unset as default."
        );
        assert_eq!(
            profile_message(ProfileAction::EnableNewsletter, 5),
            "Enabled newsletter for 5 profiles."
        );
    }

    #[test]
    fn test_wishlist_row_shows_book_and_availability() {
        let entry = WishlistOverview {
            id: WishlistItemId::new(4),
            user_email: "ada@example.com".to_owned(),
            slug: "dune".to_owned(),
            title: "Dune".to_owned(),
            author_name: Some("Frank Herbert".to_owned()),
            price: bookbazar_core::Money::from_cents(1299),
            is_available: false,
            added_date: chrono::Utc::now(),
        };
        let row = AdminWishlistRow::from(&entry);
        assert_eq!(row.book, "Dune by Frank Herbert");
        assert_eq!(row.price, "$12.99");
        assert_eq!(row.availability, "Unavailable");

        let anonymous = AdminWishlistRow::from(&WishlistOverview {
            author_name: None,
            is_available: true,
            ..entry
        });
        assert_eq!(anonymous.book, "Dune");
        assert_eq!(anonymous.availability, "Available");
    }
}
