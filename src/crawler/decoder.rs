//! Page decoder for the two feed payload shapes
//!
//! The first page of a profile arrives embedded in the landing page HTML as a
//! `window._sharedData = {…};` script. Every later page is a standalone GraphQL
//! JSON document. The two shapes nest the timeline differently and name the
//! capture timestamp differently (`date` vs `taken_at_timestamp`).
//!
//! Each shape is decoded with its own strict schema and then mapped into the
//! normalized [`PageResult`]. Missing or mistyped fields reject the whole page
//! instead of producing zero values.

use crate::{HarvestError, Result};
use chrono::{DateTime, TimeZone, Utc};
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

/// One feed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRecord {
    pub image_url: Url,
    pub thumbnail_url: Url,
    pub is_video: bool,
    pub captured_at: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
}

/// Pagination state reported by a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Continuation token; always present when `has_next` is true
    pub end_cursor: Option<String>,
    pub has_next: bool,
}

/// One decoded page of a feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    /// Entries in upstream order, videos included
    pub records: Vec<MediaRecord>,
    pub page_info: PageInfo,
}

impl PageResult {
    pub fn next_cursor(&self) -> Option<&str> {
        self.page_info.end_cursor.as_deref()
    }

    pub fn has_next(&self) -> bool {
        self.page_info.has_next
    }

    /// Still-image entries in upstream order
    pub fn images(&self) -> impl Iterator<Item = &MediaRecord> {
        self.records.iter().filter(|record| !record.is_video)
    }

    pub fn video_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_video).count()
    }
}

/// The first page, decoded from the profile landing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialPage {
    /// The profile's internal numeric identity
    pub subject_id: String,
    pub page: PageResult,
    /// Integrity signature seed, when the upstream still issues one
    pub signature_seed: Option<String>,
}

// ===== Raw schemas =====

#[derive(Debug, Deserialize)]
struct RawPageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct RawDimensions {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct RawEdge<N> {
    node: N,
}

/// Node shape of the embedded first page
#[derive(Debug, Deserialize)]
struct SharedDataNode {
    display_url: String,
    thumbnail_src: String,
    is_video: bool,
    date: i64,
    dimensions: RawDimensions,
}

/// Node shape of the GraphQL pages
#[derive(Debug, Deserialize)]
struct GraphqlNode {
    display_url: String,
    thumbnail_src: String,
    is_video: bool,
    taken_at_timestamp: i64,
    dimensions: RawDimensions,
}

#[derive(Debug, Deserialize)]
struct SharedData {
    #[serde(default)]
    rhx_gis: Option<String>,
    entry_data: EntryData,
}

#[derive(Debug, Deserialize)]
struct EntryData {
    #[serde(rename = "ProfilePage")]
    profile_page: Vec<ProfilePage>,
}

#[derive(Debug, Deserialize)]
struct ProfilePage {
    graphql: ProfileGraphql,
}

#[derive(Debug, Deserialize)]
struct ProfileGraphql {
    user: ProfileUser,
}

#[derive(Debug, Deserialize)]
struct ProfileUser {
    id: String,
    edge_owner_to_timeline_media: SharedDataTimeline,
}

#[derive(Debug, Deserialize)]
struct SharedDataTimeline {
    edges: Vec<RawEdge<SharedDataNode>>,
    page_info: RawPageInfo,
}

#[derive(Debug, Deserialize)]
struct GraphqlDocument {
    data: Option<GraphqlData>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    user: GraphqlUser,
}

#[derive(Debug, Deserialize)]
struct GraphqlUser {
    edge_owner_to_timeline_media: GraphqlTimeline,
}

#[derive(Debug, Deserialize)]
struct GraphqlTimeline {
    page_info: RawPageInfo,
    edges: Vec<RawEdge<GraphqlNode>>,
}

// ===== Normalization =====

const INITIAL: &str = "initial page";
const SUBSEQUENT: &str = "api page";

fn normalize_page_info(raw: RawPageInfo, context: &str) -> Result<PageInfo> {
    let end_cursor = raw.end_cursor.filter(|cursor| !cursor.is_empty());
    if raw.has_next_page && end_cursor.is_none() {
        return Err(HarvestError::decode(
            context,
            "has_next_page is true but end_cursor is missing",
        ));
    }
    Ok(PageInfo {
        end_cursor,
        has_next: raw.has_next_page,
    })
}

fn normalize_record(
    context: &str,
    display_url: &str,
    thumbnail_src: &str,
    is_video: bool,
    timestamp: i64,
    dimensions: RawDimensions,
) -> Result<MediaRecord> {
    let parse = |field: &str, value: &str| {
        Url::parse(value)
            .map_err(|e| HarvestError::decode(context, format!("invalid {} {:?}: {}", field, value, e)))
    };
    let captured_at = Utc
        .timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| HarvestError::decode(context, format!("invalid timestamp {}", timestamp)))?;

    Ok(MediaRecord {
        image_url: parse("display_url", display_url)?,
        thumbnail_url: parse("thumbnail_src", thumbnail_src)?,
        is_video,
        captured_at,
        width: dimensions.width,
        height: dimensions.height,
    })
}

/// Cuts the JSON document out of an inline script such as
/// `window._sharedData = {…};`
fn embedded_document(script: &str) -> Option<&str> {
    let start = script.find('{')?;
    let end = script.rfind('}')?;
    (start < end).then(|| &script[start..=end])
}

/// Decodes the first page from a profile landing page
///
/// # Arguments
///
/// * `html` - The landing page body
///
/// # Returns
///
/// * `Ok(InitialPage)` - Subject id, first page and optional signature seed
/// * `Err(HarvestError::PayloadDecode)` - The page does not have the expected shape
pub fn decode_initial(html: &str) -> Result<InitialPage> {
    let script = {
        let document = Html::parse_document(html);
        let selector = Selector::parse("body > script")
            .map_err(|e| HarvestError::decode(INITIAL, format!("bad selector: {:?}", e)))?;
        document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>())
            .ok_or_else(|| HarvestError::decode(INITIAL, "no inline script in body"))?
    };

    let json = embedded_document(&script)
        .ok_or_else(|| HarvestError::decode(INITIAL, "inline script holds no JSON document"))?;

    let shared: SharedData = serde_json::from_str(json)
        .map_err(|e| HarvestError::decode(INITIAL, e.to_string()))?;

    let profile = shared
        .entry_data
        .profile_page
        .into_iter()
        .next()
        .ok_or_else(|| HarvestError::decode(INITIAL, "entry_data.ProfilePage is empty"))?;
    let user = profile.graphql.user;
    if user.id.trim().is_empty() {
        return Err(HarvestError::decode(INITIAL, "user id is empty"));
    }

    let timeline = user.edge_owner_to_timeline_media;
    let records = timeline
        .edges
        .into_iter()
        .map(|edge| {
            let node = edge.node;
            normalize_record(
                INITIAL,
                &node.display_url,
                &node.thumbnail_src,
                node.is_video,
                node.date,
                node.dimensions,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(InitialPage {
        subject_id: user.id,
        page: PageResult {
            records,
            page_info: normalize_page_info(timeline.page_info, INITIAL)?,
        },
        signature_seed: shared.rhx_gis.filter(|seed| !seed.is_empty()),
    })
}

/// Decodes a GraphQL pagination response body
///
/// A body without `data` (e.g. `{"status":"fail","message":"…"}`) is rejected
/// with the upstream status and message in the error.
pub fn decode_page(body: &[u8]) -> Result<PageResult> {
    let document: GraphqlDocument = serde_json::from_slice(body)
        .map_err(|e| HarvestError::decode(SUBSEQUENT, e.to_string()))?;

    let data = document.data.ok_or_else(|| {
        HarvestError::decode(
            SUBSEQUENT,
            format!(
                "response has no data (status: {}, message: {})",
                document.status.as_deref().unwrap_or("-"),
                document.message.as_deref().unwrap_or("-")
            ),
        )
    })?;

    let timeline = data.user.edge_owner_to_timeline_media;
    let records = timeline
        .edges
        .into_iter()
        .map(|edge| {
            let node = edge.node;
            normalize_record(
                SUBSEQUENT,
                &node.display_url,
                &node.thumbnail_src,
                node.is_video,
                node.taken_at_timestamp,
                node.dimensions,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PageResult {
        records,
        page_info: normalize_page_info(timeline.page_info, SUBSEQUENT)?,
    })
}
