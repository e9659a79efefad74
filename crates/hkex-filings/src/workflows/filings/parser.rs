use super::classifier::{classify_doc_type, parse_posting_date};
use super::domain::{Candidate, CandidateLink, DocType};
use super::normalizer::normalize_text;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

const CONTEXT_DEPTH: usize = 4;
const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "caption", "legend"];

struct Selectors {
    row: Selector,
    anchor: Selector,
    nested_table: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("static selector parses");
        Selectors {
            row: parse("tr"),
            anchor: parse("a[href]"),
            nested_table: parse("table"),
        }
    })
}

/// Locates DOM nodes that may describe a filing.
///
/// Table rows are the primary source. When the page carries no usable
/// rows the document links themselves are used, each paired with the
/// closest ancestor that mentions a date.
pub(crate) fn extract_candidates(html: &str, base_url: &str) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let rows = row_candidates(&document, base.as_ref());
    if !rows.is_empty() {
        return rows;
    }

    link_candidates(&document, base.as_ref())
}

fn row_candidates(document: &Html, base: Option<&Url>) -> Vec<Candidate> {
    let sel = selectors();
    document
        .select(&sel.row)
        .filter(|row| row.select(&sel.nested_table).next().is_none())
        .filter_map(|row| {
            let cells: Vec<String> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name() == "td")
                .map(|cell| element_text(&cell))
                .collect();
            if cells.is_empty() {
                return None;
            }

            let links = collect_links(&row, base);
            if links.is_empty() {
                return None;
            }

            Some(Candidate {
                text: element_text(&row),
                cells: cells.into_iter().filter(|cell| !cell.is_empty()).collect(),
                links,
                section_hint: section_hint(&row),
            })
        })
        .collect()
}

fn link_candidates(document: &Html, base: Option<&Url>) -> Vec<Candidate> {
    let sel = selectors();
    let mut visited = HashSet::new();
    let mut candidates = Vec::new();

    for anchor in document.select(&sel.anchor) {
        let href = anchor.value().attr("href").unwrap_or_default();
        let text = element_text(&anchor);
        if !looks_like_filing(href, &text) {
            continue;
        }

        let context = date_context(anchor);
        if !visited.insert(context.id()) {
            continue;
        }

        let links = collect_links(&context, base);
        if links.is_empty() {
            continue;
        }

        let cells = context
            .children()
            .filter_map(ElementRef::wrap)
            .map(|child| element_text(&child))
            .filter(|cell| !cell.is_empty())
            .collect();

        candidates.push(Candidate {
            text: element_text(&context),
            cells,
            links,
            section_hint: section_hint(&context),
        });
    }

    candidates
}

fn looks_like_filing(href: &str, text: &str) -> bool {
    let path = href
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    path.ends_with(".pdf")
        || path.ends_with(".htm")
        || path.ends_with(".html")
        || classify_doc_type(text) != DocType::Unknown
}

/// Nearest ancestor (or the anchor's parent) whose text carries a date.
fn date_context(anchor: ElementRef<'_>) -> ElementRef<'_> {
    let mut fallback = None;
    for (depth, ancestor) in anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(CONTEXT_DEPTH)
        .enumerate()
    {
        if depth == 0 {
            fallback = Some(ancestor);
        }
        if parse_posting_date(&element_text(&ancestor)).is_some() {
            return ancestor;
        }
    }
    fallback.unwrap_or(anchor)
}

fn collect_links(element: &ElementRef<'_>, base: Option<&Url>) -> Vec<CandidateLink> {
    let sel = selectors();
    let mut seen = HashSet::new();
    element
        .select(&sel.anchor)
        .filter_map(|anchor| {
            let href = resolve_href(anchor.value().attr("href")?, base)?;
            if !seen.insert(href.clone()) {
                return None;
            }
            Some(CandidateLink {
                text: element_text(&anchor),
                href,
            })
        })
        .collect()
}

fn resolve_href(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    let lowered = raw.to_ascii_lowercase();
    if raw.is_empty()
        || raw.starts_with('#')
        || lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
    {
        return None;
    }

    match base {
        Some(base) => base.join(raw).ok().map(String::from),
        None => Url::parse(raw).ok().map(String::from),
    }
}

/// Attribute tokens and headings around a node, used to tell the Main
/// Board and GEM sections apart.
fn section_hint(element: &ElementRef<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut heading: Option<String> = None;

    for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
        for attr in ["id", "class", "data-board"] {
            if let Some(value) = ancestor.value().attr(attr) {
                parts.push(value.replace(['-', '_'], " "));
            }
        }

        if heading.is_none() {
            heading = ancestor
                .children()
                .filter_map(ElementRef::wrap)
                .find(|child| HEADINGS.contains(&child.value().name()))
                .or_else(|| {
                    ancestor
                        .prev_siblings()
                        .filter_map(ElementRef::wrap)
                        .find(|sibling| HEADINGS.contains(&sibling.value().name()))
                })
                .map(|node| element_text(&node))
                .filter(|text| !text.is_empty());
        }
    }

    if let Some(heading) = heading {
        parts.insert(0, heading);
    }
    normalize_text(&parts.join(" "))
}

fn element_text(element: &ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www1.hkexnews.hk/app/appindex.html";

    #[test]
    fn table_rows_become_candidates() {
        let html = r#"
            <html><body>
            <div id="gem-ap">
              <h2>GEM</h2>
              <table>
                <tr><th>Posting Date</th><th>Applicant</th><th>Documents</th></tr>
                <tr>
                  <td>17/10/2026</td>
                  <td>Nova Robotics Limited</td>
                  <td><a href="../app/gem/2026/1/ap.pdf">Application Proof</a>
                      <a href="javascript:void(0)">Print</a></td>
                </tr>
                <tr><td>no link here</td></tr>
              </table>
            </div>
            </body></html>"#;

        let candidates = extract_candidates(html, BASE);
        assert_eq!(candidates.len(), 1);
        let row = &candidates[0];
        assert_eq!(row.cells, vec!["17/10/2026", "Nova Robotics Limited", "Application Proof Print"]);
        assert_eq!(row.links.len(), 1);
        assert_eq!(row.links[0].href, "https://www1.hkexnews.hk/app/gem/2026/1/ap.pdf");
        assert!(row.section_hint.starts_with("GEM"));
        assert!(row.section_hint.contains("gem ap"));
    }

    #[test]
    fn rows_wrapping_nested_tables_are_skipped() {
        let html = r#"
            <table><tr><td>
              <table><tr><td>17/10/2026</td><td>Inner Ltd</td><td><a href="/a.pdf">AP</a></td></tr></table>
            </td></tr></table>"#;

        let candidates = extract_candidates(html, BASE);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].cells[1], "Inner Ltd");
    }

    #[test]
    fn falls_back_to_links_with_dated_context() {
        let html = r#"
            <ul class="main-board">
              <li><span>17/10/2026</span> <span>Orbit Holdings Limited</span>
                  <a href="/app/sehk/2026/9/phip.pdf">PHIP</a>
                  <a href="/app/sehk/2026/9/phip-c.pdf">PHIP (Chinese)</a></li>
              <li><a href="/about.html">About us</a></li>
            </ul>"#;

        let candidates = extract_candidates(html, BASE);
        assert_eq!(candidates.len(), 2);
        let dated = &candidates[0];
        assert_eq!(dated.links.len(), 2);
        assert!(dated.text.starts_with("17/10/2026 Orbit Holdings Limited"));
        assert!(dated.section_hint.contains("main board"));
    }

    #[test]
    fn link_context_stops_four_levels_up() {
        let html = r#"
            <html><body>
            <div id="listing">17/10/2026
              <div><div><div>
                <p><a href="/app/sehk/2026/9/deep.pdf">Application Proof</a></p>
              </div></div></div>
            </div>
            </body></html>"#;

        let candidates = extract_candidates(html, BASE);
        assert_eq!(candidates.len(), 1);
        let context = &candidates[0];
        assert_eq!(context.text, "Application Proof");
        assert_eq!(context.cells, vec!["Application Proof"]);
        assert_eq!(context.links[0].href, "https://www1.hkexnews.hk/app/sehk/2026/9/deep.pdf");
        assert!(parse_posting_date(&context.text).is_none());
    }

    #[test]
    fn resolve_href_rejects_non_navigational_links() {
        let base = Url::parse(BASE).ok();
        assert_eq!(resolve_href("#top", base.as_ref()), None);
        assert_eq!(resolve_href("JavaScript:void(0)", base.as_ref()), None);
        assert_eq!(
            resolve_href("/app/x.pdf", base.as_ref()).as_deref(),
            Some("https://www1.hkexnews.hk/app/x.pdf")
        );
        assert_eq!(resolve_href("relative.pdf", None), None);
    }
}
