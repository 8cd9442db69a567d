//! Contributors and the fixed catalog of contributor roles.
//!
//! Each role carries a display title and a stable three-letter code. The code
//! is what gets written to storage and interchange formats; the position of a
//! variant in the enum carries no meaning and may change freely.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

// ─── Role catalog ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  EnumIter,
  EnumString,
  IntoStaticStr,
  Serialize,
  Deserialize,
)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ContributorRole {
  #[strum(serialize = "aut")]
  Author,
  #[strum(serialize = "adp")]
  Adapter,
  #[strum(serialize = "aqt")]
  AuthorInQuotations,
  #[strum(serialize = "aft")]
  AuthorOfAfterward,
  #[strum(serialize = "aui")]
  AuthorOfIntroduction,
  #[strum(serialize = "cph")]
  CopyrightHolder,
  #[strum(serialize = "cov")]
  CoverDesigner,
  #[strum(serialize = "dsr")]
  Designer,
  #[strum(serialize = "dst")]
  Distributor,
  #[strum(serialize = "edt")]
  Editor,
  #[strum(serialize = "ive")]
  Interviewee,
  #[strum(serialize = "ivr")]
  Interviewer,
  #[strum(serialize = "lyr")]
  Lyricist,
  #[strum(serialize = "otr")]
  Other,
  #[strum(serialize = "pht")]
  Photographer,
  #[strum(serialize = "pfr")]
  Proofreader,
  #[strum(serialize = "pbl")]
  Publisher,
  #[strum(serialize = "rpt")]
  Reporter,
  #[strum(serialize = "rth")]
  ResearchTeamHead,
  #[strum(serialize = "rtm")]
  ResearchTeamMember,
  #[strum(serialize = "rev")]
  Reviewer,
  #[strum(serialize = "sad")]
  ScientificAdvisor,
  #[strum(serialize = "stn")]
  StandardsBody,
  #[strum(serialize = "ths")]
  ThesisAdvisor,
  #[strum(serialize = "trc")]
  Transcriber,
  #[strum(serialize = "trl")]
  Translator,
  #[strum(serialize = "wam")]
  WriterOfAccompanyingMaterial,
}

impl ContributorRole {
  /// The stable three-letter code, e.g. `"aut"`.
  pub fn code(self) -> &'static str { self.into() }

  /// Resolve a role from its three-letter code.
  pub fn from_code(code: &str) -> Result<Self> {
    Self::from_str(code).map_err(|_| Error::UnknownRole(code.to_owned()))
  }

  /// Human-readable title, e.g. `"Author of Introduction"`.
  pub fn title(self) -> &'static str {
    match self {
      Self::Author => "Author",
      Self::Adapter => "Adapter",
      Self::AuthorInQuotations => "Author in Quotations",
      Self::AuthorOfAfterward => "Author of Afterward",
      Self::AuthorOfIntroduction => "Author of Introduction",
      Self::CopyrightHolder => "Copyright Holder",
      Self::CoverDesigner => "Cover Designer",
      Self::Designer => "Designer",
      Self::Distributor => "Distributor",
      Self::Editor => "Editor",
      Self::Interviewee => "Interviewee",
      Self::Interviewer => "Interviewer",
      Self::Lyricist => "Lyricist",
      Self::Other => "Other",
      Self::Photographer => "Photographer",
      Self::Proofreader => "Proofreader",
      Self::Publisher => "Publisher",
      Self::Reporter => "Reporter",
      Self::ResearchTeamHead => "Research Team Head",
      Self::ResearchTeamMember => "Research Team Member",
      Self::Reviewer => "Reviewer",
      Self::ScientificAdvisor => "Scientific Advisor",
      Self::StandardsBody => "Standards Body",
      Self::ThesisAdvisor => "Thesis Advisor",
      Self::Transcriber => "Transcriber",
      Self::Translator => "Translator",
      Self::WriterOfAccompanyingMaterial => "Writer of Accompanying Material",
    }
  }
}

impl TryFrom<String> for ContributorRole {
  type Error = Error;

  fn try_from(code: String) -> Result<Self> { Self::from_code(&code) }
}

// ─── Contributor ─────────────────────────────────────────────────────────────

/// A named participant in a work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contributor {
  pub name:         String,
  /// The form used for sorting, e.g. `"Austen, Jane"`.
  pub sort_by_name: String,
  pub role:         ContributorRole,
}

impl Contributor {
  pub fn new(
    name: impl Into<String>,
    sort_by_name: impl Into<String>,
    role: ContributorRole,
  ) -> Self {
    Self { name: name.into(), sort_by_name: sort_by_name.into(), role }
  }
}
