use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Listing board an applicant is seeking admission to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Board {
    #[serde(rename = "Main Board")]
    MainBoard,
    #[serde(rename = "GEM")]
    Gem,
    #[serde(rename = "Unknown", other)]
    Unknown,
}

impl Board {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MainBoard => "Main Board",
            Self::Gem => "GEM",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Filing stage. PHIP follows the listing hearing, AP precedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "AP")]
    ApplicationProof,
    #[serde(rename = "PHIP")]
    Phip,
    #[serde(rename = "Unknown", other)]
    Unknown,
}

impl DocType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ApplicationProof => "AP",
            Self::Phip => "PHIP",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One classified row of the listings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    pub applicant_name: String,
    pub board: Board,
    pub doc_type: DocType,
    pub posting_date_hkt: NaiveDate,
    pub link: String,
    pub raw_text: String,
}

/// Anchor found inside a candidate node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub text: String,
    pub href: String,
}

/// DOM node that might describe a filing, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub cells: Vec<String>,
    pub links: Vec<CandidateLink>,
    pub section_hint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_serialized_form() {
        for board in [Board::MainBoard, Board::Gem, Board::Unknown] {
            let json = serde_json::to_string(&board).expect("serialize board");
            assert_eq!(json, format!("\"{}\"", board.label()));
        }
        let json = serde_json::to_string(&DocType::Phip).expect("serialize doc type");
        assert_eq!(json, "\"PHIP\"");
    }

    #[test]
    fn unrecognized_labels_deserialize_as_unknown() {
        let board: Board = serde_json::from_str("\"Star Market\"").expect("board");
        assert_eq!(board, Board::Unknown);
        let doc: DocType = serde_json::from_str("\"Prospectus\"").expect("doc type");
        assert_eq!(doc, DocType::Unknown);
    }
}
