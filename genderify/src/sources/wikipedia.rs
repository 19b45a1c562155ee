//! Wikipedia (primary source) page parsing
//!
//! Consumes the infobox field table (`th[scope=row]` → `td`) and the body
//! paragraphs.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{clean_text, PageLink, SourceKind, SourcePage, MEMBERS_FIELD};
use crate::models::ArtistIdentity;

pub const BASE_URL: &str = "https://en.wikipedia.org";

/// Infobox rows present on musician and group pages
pub const ARTIST_MARKERS: &[&str] = &["Genres", "Labels", "Instruments"];

static INFOBOX_ROW_HEADERS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"table.infobox tr th[scope="row"]"#).expect("valid selector"));
static DATA_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));
static LIST_ITEMS: Lazy<Selector> = Lazy::new(|| Selector::parse("li").expect("valid selector"));
static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static LIST_ANCHORS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li a[href]").expect("valid selector"));
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid selector"));

/// Parse a Wikipedia article
pub fn parse_page(url: &str, body: &str) -> SourcePage {
    let document = Html::parse_document(body);

    let headers: Vec<ElementRef> = document.select(&INFOBOX_ROW_HEADERS).collect();
    let field_names = headers.iter().map(|th| element_text(th)).collect();
    let members = headers
        .iter()
        .find(|th| element_text(th) == MEMBERS_FIELD)
        .map(extract_members);

    let bio = document
        .select(&PARAGRAPHS)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");

    SourcePage {
        kind: SourceKind::Wikipedia,
        url: url.to_string(),
        text: document.root_element().text().collect(),
        field_names,
        members,
        bio,
        list_links: collect_links(&document, &LIST_ANCHORS),
        links: collect_links(&document, &ANCHORS),
    }
}

/// Members listed in the data cell next to the "Members" header
///
/// List items are preferred; a cell of bare links is the fallback.
fn extract_members(header: &ElementRef) -> Vec<ArtistIdentity> {
    let cell = header
        .parent()
        .and_then(ElementRef::wrap)
        .and_then(|row| row.select(&DATA_CELL).next());
    let Some(cell) = cell else {
        return Vec::new();
    };

    let items: Vec<ElementRef> = cell.select(&LIST_ITEMS).collect();
    if items.is_empty() {
        return cell
            .select(&ANCHORS)
            .filter_map(|a| member(element_text(&a), a.value().attr("href")))
            .collect();
    }

    items
        .iter()
        .filter_map(|li| {
            let href = li.select(&ANCHORS).next().and_then(|a| a.value().attr("href"));
            member(element_text(li), href)
        })
        .collect()
}

fn member(name: String, href: Option<&str>) -> Option<ArtistIdentity> {
    if name.is_empty() {
        return None;
    }
    let mut identity = ArtistIdentity::new(name);
    identity.primary_url = href
        .filter(|h| !h.starts_with('#'))
        .map(|h| SourceKind::Wikipedia.absolute_url(h));
    Some(identity)
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
                href: SourceKind::Wikipedia.absolute_url(href),
            })
        })
        .collect()
}

fn element_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}
