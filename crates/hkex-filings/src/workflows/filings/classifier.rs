use super::domain::{Board, Candidate, CandidateLink, DocType, FilingRecord};
use super::normalizer::normalize_text;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    dmy: Regex,
    ymd: Regex,
    cjk_date: Regex,
    english_date: Regex,
    phip: Regex,
    ap: Regex,
    main_board: Regex,
    gem: Regex,
    labels: Regex,
    submission: Regex,
    noise: Regex,
    company_suffix: Regex,
    english_company: Regex,
    chinese_company: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |pattern: &str| Regex::new(pattern).expect("static pattern compiles");
        Patterns {
            dmy: compile(r"\b([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})\b"),
            ymd: compile(r"\b([0-9]{4})[-/]([0-9]{1,2})[-/]([0-9]{1,2})\b"),
            cjk_date: compile(r"([0-9]{4})\s*年\s*([0-9]{1,2})\s*月\s*([0-9]{1,2})\s*日"),
            english_date: compile(
                r"(?i)\b([0-9]{1,2})\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+([0-9]{4})\b",
            ),
            phip: compile(
                r"(?i:\bphip\b|post[\s-]*hearing\s+information\s+pack)|聆訊後資料集|聆讯后资料集",
            ),
            ap: compile(r"(?i:application\s+proof)|\bAP\b|申請版本|申请版本"),
            main_board: compile(r"(?i:main\s*board|\bsehk\b)|主板"),
            gem: compile(r"(?i:\bgem\b|growth\s+enterprise\s+market)|創業板|创业板"),
            labels: compile(
                r"(?i:\b(?:name\s+of\s+applicant|applicant(?:\s+name)?|posting\s+date|date)\s*:)|(?:申請人|申请人|發佈日期|发布日期|日期)\s*:",
            ),
            submission: compile(
                r"(?i:\(\s*[0-9]+\s*(?:st|nd|rd|th)?\s+submission\s*\))|\(\s*第\s*[一二三四五六七八九十0-9]+\s*次(?:呈交|遞交|递交)\s*\)",
            ),
            noise: compile(
                r"(?i:\(\s*(?:chinese|english)(?:\s+version)?\s*\)|\b(?:multi-?files?|full\s+(?:version|document)|related\s+materials?|documents?|pdf)\b)|\(\s*(?:中文|英文)版?\s*\)|多檔案|多档案|全文|相關資料|相关资料",
            ),
            company_suffix: compile(
                r"(?i:\b(?:limited|ltd|inc|incorporated|corporation|corp|holdings?|group|company|plc)\b)|公司|集團|集团|控股",
            ),
            english_company: compile(
                r"[A-Z0-9][A-Za-z0-9&.,'’()\- ]*?\b(?i:limited|ltd|inc|incorporated|corporation|corp|holdings|group|company|plc)\b\.?(?:\s*,?\s*(?i:limited|ltd|inc|incorporated|corporation|corp|holdings|group|company|plc|co)\b\.?)*",
            ),
            chinese_company: compile(
                r"[\p{Han}A-Za-z0-9()·]{2,}?(?:股份有限公司|有限公司|集團|集团|控股)+",
            ),
        }
    })
}

/// Returns the earliest valid date mentioned in `text`.
pub(crate) fn parse_posting_date(text: &str) -> Option<NaiveDate> {
    let p = patterns();
    let mut found: Vec<(usize, NaiveDate)> = Vec::new();

    for caps in p.dmy.captures_iter(text) {
        if let Some(date) = ymd_from(&caps[3], &caps[2], &caps[1]) {
            found.push((caps.get(0).map_or(0, |m| m.start()), date));
        }
    }
    for re in [&p.ymd, &p.cjk_date] {
        for caps in re.captures_iter(text) {
            if let Some(date) = ymd_from(&caps[1], &caps[2], &caps[3]) {
                found.push((caps.get(0).map_or(0, |m| m.start()), date));
            }
        }
    }
    for caps in p.english_date.captures_iter(text) {
        let month = month_number(&caps[2]);
        let date = month.and_then(|month| {
            let year = caps[3].parse().ok()?;
            let day = caps[1].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        });
        if let Some(date) = date {
            found.push((caps.get(0).map_or(0, |m| m.start()), date));
        }
    }

    found.into_iter().min_by_key(|(start, _)| *start).map(|(_, date)| date)
}

fn ymd_from(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_number(prefix: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix = prefix.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|month| *month == prefix)
        .map(|index| index as u32 + 1)
}

pub(crate) fn classify_doc_type(text: &str) -> DocType {
    let p = patterns();
    if p.phip.is_match(text) {
        DocType::Phip
    } else if p.ap.is_match(text) {
        DocType::ApplicationProof
    } else {
        DocType::Unknown
    }
}

/// Board from the row itself, then the surrounding section, then the
/// document path.
pub(crate) fn classify_board(text: &str, section_hint: &str, link: &str) -> Board {
    board_from_text(text)
        .or_else(|| board_from_text(section_hint))
        .or_else(|| board_from_link(link))
        .unwrap_or(Board::Unknown)
}

fn board_from_text(text: &str) -> Option<Board> {
    let p = patterns();
    match (p.main_board.is_match(text), p.gem.is_match(text)) {
        (true, false) => Some(Board::MainBoard),
        (false, true) => Some(Board::Gem),
        _ => None,
    }
}

fn board_from_link(link: &str) -> Option<Board> {
    let lowered = link.to_ascii_lowercase();
    if lowered.contains("/sehk/") {
        Some(Board::MainBoard)
    } else if lowered.contains("/gem/") {
        Some(Board::Gem)
    } else {
        None
    }
}

pub(crate) fn infer_applicant_name(candidate: &Candidate) -> Option<String> {
    let p = patterns();
    let cleaned_cells: Vec<String> = candidate
        .cells
        .iter()
        .map(|cell| clean_name(cell))
        .filter(|cell| is_plausible_name(cell) && !is_board_only(cell))
        .collect();

    if let Some(name) = cleaned_cells.iter().find(|cell| has_suffix(cell)) {
        return Some(name.clone());
    }
    if let Some(name) = cleaned_cells.iter().max_by_key(|cell| cell.chars().count()) {
        return Some(name.clone());
    }

    let cleaned = clean_name(&candidate.text);
    [&p.english_company, &p.chinese_company]
        .into_iter()
        .filter_map(|re| re.find(&cleaned))
        .min_by_key(|m| m.start())
        .map(|m| tidy(m.as_str()))
        .filter(|name| is_plausible_name(name))
}

fn has_suffix(value: &str) -> bool {
    patterns().company_suffix.is_match(value)
}

fn is_board_only(value: &str) -> bool {
    let p = patterns();
    let rest = p.main_board.replace_all(value, " ");
    let rest = p.gem.replace_all(&rest, " ");
    !is_plausible_name(&rest)
}

fn is_plausible_name(value: &str) -> bool {
    value.chars().filter(|c| c.is_alphabetic()).count() >= 2
}

/// Strips dates, labels, document phrases and submission counters.
fn clean_name(value: &str) -> String {
    let p = patterns();
    let mut text = normalize_text(value);
    for re in [
        &p.submission,
        &p.labels,
        &p.dmy,
        &p.ymd,
        &p.cjk_date,
        &p.english_date,
        &p.phip,
        &p.ap,
        &p.noise,
    ] {
        text = re.replace_all(&text, " ").into_owned();
    }
    tidy(&text)
}

fn tidy(value: &str) -> String {
    let collapsed = normalize_text(value);
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | '|' | ':' | ';' | ',' | '/'))
        .replace("( )", "")
        .replace("()", "")
        .trim()
        .to_string()
}

/// Turns a candidate into a record, or `None` when the date, applicant or
/// link cannot be determined.
pub(crate) fn classify(candidate: &Candidate) -> Option<FilingRecord> {
    let posting_date = parse_posting_date(&candidate.text)?;

    let link_text = candidate
        .links
        .iter()
        .map(|link| link.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let doc_type = match classify_doc_type(&link_text) {
        DocType::Unknown => classify_doc_type(&candidate.text),
        known => known,
    };

    let link = pick_link(&candidate.links, doc_type)?;
    let applicant_name = infer_applicant_name(candidate)?;
    let board = classify_board(&candidate.text, &candidate.section_hint, &link.href);

    Some(FilingRecord {
        applicant_name,
        board,
        doc_type,
        posting_date_hkt: posting_date,
        link: link.href.clone(),
        raw_text: candidate.text.clone(),
    })
}

fn pick_link(links: &[CandidateLink], doc_type: DocType) -> Option<&CandidateLink> {
    if doc_type != DocType::Unknown {
        if let Some(link) = links
            .iter()
            .find(|link| classify_doc_type(&link.text) == doc_type)
        {
            return Some(link);
        }
    }
    links.first()
}
