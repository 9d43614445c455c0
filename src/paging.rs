//! Offset-based pagination over listing services.

use serde_json::Value;
use tracing::debug;

use crate::api::{ListingService, Paging, Selector};
use crate::error::ApiError;

/// Page size used by every paginated listing call.
pub const PAGE_SIZE: u32 = 500;

/// Read `totalNumEntries` from a page. The SOAP layer may render it as text.
fn total_num_entries(page: &Value) -> Result<u64, ApiError> {
    match page.get("totalNumEntries") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ApiError::MalformedResponse("page has no usable totalNumEntries".into()))
}

/// Fetch every page of a listing, mapping each entry through `map`.
///
/// `startIndex` advances by `page_size` after each call and the loop stops
/// once it reaches the reported `totalNumEntries`, whatever the pages
/// actually contained.
pub fn iterate_pages<T, F>(
    service: &dyn ListingService,
    selector: &Selector,
    page_size: u32,
    mut map: F,
) -> Result<Vec<T>, ApiError>
where
    F: FnMut(Value) -> T,
{
    let mut selector = selector.clone();
    let paging = selector.paging.get_or_insert(Paging {
        start_index: 0,
        number_results: page_size,
    });
    let mut offset = u64::from(paging.start_index);

    let mut results = Vec::new();
    loop {
        let mut page = service.get(&selector)?;
        let total = total_num_entries(&page)?;

        if let Some(Value::Array(entries)) = page.get_mut("entries").map(Value::take) {
            debug!(offset, received = entries.len(), total, "Fetched page");
            results.extend(entries.into_iter().map(&mut map));
        }

        offset += u64::from(page_size);
        if offset >= total {
            break;
        }
        if let Some(ref mut paging) = selector.paging {
            paging.start_index = u32::try_from(offset).map_err(|_| {
                ApiError::MalformedResponse(format!("startIndex {} out of range", offset))
            })?;
        }
    }

    Ok(results)
}
