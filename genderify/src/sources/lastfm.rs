//! Last.fm wiki (secondary source) page parsing
//!
//! Consumes the factbox (`.factbox-item` with a `.factbox-heading`) and the
//! `.wiki-content` paragraphs.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{clean_text, PageLink, SourceKind, SourcePage, MEMBERS_FIELD};
use crate::models::ArtistIdentity;

pub const BASE_URL: &str = "https://www.last.fm";

/// Factbox headings present on artist wiki pages
pub const ARTIST_MARKERS: &[&str] = &["Born", "Born In", "Founded In", "Years Active", "Members"];

const WIKI_SUFFIX: &str = "/+wiki";

static FACTBOX_ITEMS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".factbox-item").expect("valid selector"));
static FACTBOX_HEADING: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".factbox-heading").expect("valid selector"));
static LIST_ITEMS: Lazy<Selector> = Lazy::new(|| Selector::parse("li").expect("valid selector"));
static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static LIST_ANCHORS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li a[href]").expect("valid selector"));
static BIO_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".wiki-content p").expect("valid selector"));

/// Parse a Last.fm artist wiki page
pub fn parse_page(url: &str, body: &str) -> SourcePage {
    let document = Html::parse_document(body);

    let mut field_names = Vec::new();
    let mut members = None;
    for item in document.select(&FACTBOX_ITEMS) {
        let Some(heading) = item.select(&FACTBOX_HEADING).next() else {
            continue;
        };
        let heading = element_text(&heading);
        if heading == MEMBERS_FIELD && members.is_none() {
            members = Some(extract_members(&item));
        }
        field_names.push(heading);
    }

    let bio = document
        .select(&BIO_PARAGRAPHS)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");

    SourcePage {
        kind: SourceKind::LastFm,
        url: url.to_string(),
        text: document.root_element().text().collect(),
        field_names,
        members,
        bio,
        list_links: collect_links(&document, &LIST_ANCHORS),
        links: collect_links(&document, &ANCHORS),
    }
}

/// Members listed under the factbox "Members" heading
///
/// Link text is used as the name; list items also carry active years.
fn extract_members(item: &ElementRef) -> Vec<ArtistIdentity> {
    item.select(&LIST_ITEMS)
        .filter_map(|li| {
            let link = li.select(&ANCHORS).next();
            let name = match &link {
                Some(a) => element_text(a),
                None => element_text(&li),
            };
            if name.is_empty() {
                return None;
            }
            let mut identity = ArtistIdentity::new(name);
            identity.secondary_url = link
                .and_then(|a| a.value().attr("href"))
                .map(wiki_url);
            Some(identity)
        })
        .collect()
}

/// Artist wiki URL for an artist href
fn wiki_url(href: &str) -> String {
    let url = SourceKind::LastFm.absolute_url(href);
    if url.ends_with(WIKI_SUFFIX) {
        url
    } else {
        format!("{}{}", url.trim_end_matches('/'), WIKI_SUFFIX)
    }
}

fn collect_links(document: &Html, selector: &Selector) -> Vec<PageLink> {
    document
        .select(selector)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            if href.starts_with('#') {
                return None;
            }
            Some(PageLink {
                text: element_text(&a),
                title: a.value().attr("title").map(str::to_string),
                href: SourceKind::LastFm.absolute_url(href),
            })
        })
        .collect()
}

fn element_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}
