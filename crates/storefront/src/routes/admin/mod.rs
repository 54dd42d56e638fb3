//! Staff back office at `/admin`.
//!
//! List pages submit ticked row ids plus an `action`; each handler applies
//! the action in one statement and flashes how many rows changed.

pub mod catalog;
pub mod customers;
pub mod dashboard;
pub mod sales;

use serde::de::DeserializeOwned;

use crate::forms::BulkAction;
use crate::middleware::PageContext;
use crate::models::FlashLevel;

/// Decode a bulk action body. Flashes and returns `None` when there is
/// nothing to do.
pub(crate) async fn parse_bulk<A: DeserializeOwned>(
    ctx: &PageContext,
    body: &[u8],
) -> Option<BulkAction<A>> {
    let Some(bulk) = BulkAction::<A>::parse(body) else {
        ctx.flash(FlashLevel::Warning, "No action selected.").await;
        return None;
    };
    if bulk.ids.is_empty() {
        ctx.flash(
            FlashLevel::Warning,
            "Items must be selected in order to perform actions on them. No items have been changed.",
        )
        .await;
        return None;
    }
    Some(bulk)
}

/// Date column format used across the back office.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
