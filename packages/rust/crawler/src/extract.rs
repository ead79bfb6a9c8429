//! HTML field extraction for listing pages and review panels.
//!
//! Selectors target map.kakao.com markup. Extraction is isolated per
//! element: a listing or review missing required sub-fields is skipped and
//! logged, and the rest of the document still parses.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use reviewscout_shared::ReviewEntry;

/// A listing successfully parsed from a result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingInfo {
    /// Zero-based position among the page's listing elements. Kept even when
    /// earlier listings are skipped, so review-panel targeting stays aligned
    /// with the document.
    pub index: usize,
    /// Listing name as displayed.
    pub name: String,
    /// Aggregate score text.
    pub score: String,
    /// Street address line.
    pub address: String,
}

/// Parse the restaurant listings on a result page, in document order.
///
/// A listing where name, score, or address cannot be resolved is skipped
/// with a warning.
pub fn parse_listings(html: &str) -> Vec<ListingInfo> {
    let doc = Html::parse_document(html);
    let listing_sel = Selector::parse(".placelist > .PlaceItem").unwrap();
    let name_sel = Selector::parse(".head_item > .tit_name > .link_name").unwrap();
    let score_sel = Selector::parse(".rating > .score > em").unwrap();
    let address_sel = Selector::parse(".addr > p").unwrap();

    let mut listings = Vec::new();
    for (index, item) in doc.select(&listing_sel).enumerate() {
        let name = text_of(item, &name_sel);
        let score = text_of(item, &score_sel);
        let address = text_of(item, &address_sel);

        match (name, score, address) {
            (Some(name), Some(score), Some(address)) => listings.push(ListingInfo {
                index,
                name,
                score,
                address,
            }),
            _ => warn!(index, "listing missing required fields, skipping"),
        }
    }
    listings
}

/// Parse review entries from an expanded review panel.
///
/// Review elements missing any sub-field are skipped; the caller substitutes
/// the placeholder entry when nothing survives.
pub fn parse_reviews(html: &str) -> Vec<ReviewEntry> {
    let doc = Html::parse_document(html);
    let review_sel = Selector::parse(".list_evaluation > li").unwrap();
    let level_sel = Selector::parse("a > div > div > span:nth-of-type(2)").unwrap();
    let count_sel = Selector::parse("div > span:nth-of-type(3)").unwrap();
    let average_sel = Selector::parse("div > span:nth-of-type(5)").unwrap();
    let star_sel = Selector::parse(".ico_star.inner_star").unwrap();
    let comment_sel = Selector::parse(".txt_comment > span").unwrap();

    let mut entries = Vec::new();
    for (index, item) in doc.select(&review_sel).enumerate() {
        let parsed = || -> Option<ReviewEntry> {
            let level = text_of(item, &level_sel)?;
            let count = text_of(item, &count_sel)?;
            let average = text_of(item, &average_sel)?;
            let star = star_width(item, &star_sel)?;
            let comment = text_of(item, &comment_sel)?;
            Some(ReviewEntry::from_parts(
                &level, &count, &average, &star, &comment,
            ))
        }();

        match parsed {
            Some(entry) => entries.push(entry),
            None => debug!(index, "review element missing sub-fields, skipping"),
        }
    }
    entries
}

/// Trimmed text of the first match under `el`, or `None` when the element
/// is absent or blank.
fn text_of(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel)
        .next()
        .map(|n| n.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Star rating taken from the inline width of the filled-star bar,
/// e.g. `style="width:90%"` yields `90%`.
fn star_width(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    let style = el.select(sel).next()?.value().attr("style")?;
    let width = style.split(':').nth(1)?;
    Some(width.trim().trim_end_matches(';').trim().to_string())
}
