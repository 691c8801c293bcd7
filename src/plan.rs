// src/plan.rs
//! Account plan record and the lenient parser for model replies.

use serde::{Deserialize, Serialize};

/// The six fixed sections, in prompt/heading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKey {
    ExecutiveSummary,
    CompanyOverview,
    KeyContacts,
    StrengthsWeaknesses,
    OpportunitiesRisks,
    EngagementPlan,
}

impl SectionKey {
    pub const ALL: [SectionKey; 6] = [
        SectionKey::ExecutiveSummary,
        SectionKey::CompanyOverview,
        SectionKey::KeyContacts,
        SectionKey::StrengthsWeaknesses,
        SectionKey::OpportunitiesRisks,
        SectionKey::EngagementPlan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::ExecutiveSummary => "executive_summary",
            SectionKey::CompanyOverview => "company_overview",
            SectionKey::KeyContacts => "key_contacts",
            SectionKey::StrengthsWeaknesses => "strengths_weaknesses",
            SectionKey::OpportunitiesRisks => "opportunities_risks",
            SectionKey::EngagementPlan => "engagement_plan",
        }
    }

    /// Literal heading the plan prompt asks the model to emit (without the colon).
    pub fn heading(self) -> &'static str {
        match self {
            SectionKey::ExecutiveSummary => "EXECUTIVE SUMMARY",
            SectionKey::CompanyOverview => "COMPANY OVERVIEW",
            SectionKey::KeyContacts => "KEY CONTACTS",
            SectionKey::StrengthsWeaknesses => "STRENGTHS & WEAKNESSES",
            SectionKey::OpportunitiesRisks => "OPPORTUNITIES & RISKS",
            SectionKey::EngagementPlan => "ENGAGEMENT PLAN",
        }
    }

    /// All markers must occur in the upper-cased line for it to count as this heading.
    fn markers(self) -> &'static [&'static str] {
        match self {
            SectionKey::ExecutiveSummary => &["EXECUTIVE SUMMARY"],
            SectionKey::CompanyOverview => &["COMPANY OVERVIEW"],
            SectionKey::KeyContacts => &["KEY CONTACTS"],
            SectionKey::StrengthsWeaknesses => &["STRENGTHS", "WEAKNESSES"],
            SectionKey::OpportunitiesRisks => &["OPPORTUNITIES", "RISKS"],
            SectionKey::EngagementPlan => &["ENGAGEMENT PLAN"],
        }
    }

    /// First matching key in priority order.
    pub fn detect(line: &str) -> Option<SectionKey> {
        let upper = line.to_uppercase();
        SectionKey::ALL
            .into_iter()
            .find(|k| k.markers().iter().all(|m| upper.contains(m)))
    }

    /// "Content for Executive Summary will be generated."
    pub fn placeholder(self) -> String {
        let title = self
            .as_str()
            .split('_')
            .map(|w| {
                let mut cs = w.chars();
                match cs.next() {
                    Some(c) => c.to_uppercase().chain(cs).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!("Content for {title} will be generated.")
    }
}

/// Six-section briefing. Every field is always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPlan {
    pub executive_summary: String,
    pub company_overview: String,
    pub key_contacts: String,
    pub strengths_weaknesses: String,
    pub opportunities_risks: String,
    pub engagement_plan: String,
}

impl AccountPlan {
    pub fn section(&self, key: SectionKey) -> &str {
        match key {
            SectionKey::ExecutiveSummary => &self.executive_summary,
            SectionKey::CompanyOverview => &self.company_overview,
            SectionKey::KeyContacts => &self.key_contacts,
            SectionKey::StrengthsWeaknesses => &self.strengths_weaknesses,
            SectionKey::OpportunitiesRisks => &self.opportunities_risks,
            SectionKey::EngagementPlan => &self.engagement_plan,
        }
    }

    fn section_mut(&mut self, key: SectionKey) -> &mut String {
        match key {
            SectionKey::ExecutiveSummary => &mut self.executive_summary,
            SectionKey::CompanyOverview => &mut self.company_overview,
            SectionKey::KeyContacts => &mut self.key_contacts,
            SectionKey::StrengthsWeaknesses => &mut self.strengths_weaknesses,
            SectionKey::OpportunitiesRisks => &mut self.opportunities_risks,
            SectionKey::EngagementPlan => &mut self.engagement_plan,
        }
    }

    /// Render in the same heading format the model is asked to produce.
    pub fn to_text(&self) -> String {
        SectionKey::ALL
            .iter()
            .map(|k| format!("{}:\n{}\n", k.heading(), self.section(*k)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Single pass over the reply. Heading lines switch the current section and
/// are consumed; other non-blank lines are appended to the current section;
/// text before the first heading is dropped. Empty sections get placeholders.
pub fn parse(text: &str) -> AccountPlan {
    let mut plan = AccountPlan {
        executive_summary: String::new(),
        company_overview: String::new(),
        key_contacts: String::new(),
        strengths_weaknesses: String::new(),
        opportunities_risks: String::new(),
        engagement_plan: String::new(),
    };
    let mut current: Option<SectionKey> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(key) = SectionKey::detect(line) {
            current = Some(key);
            continue;
        }
        if let Some(key) = current {
            let buf = plan.section_mut(key);
            buf.push_str(line);
            buf.push('\n');
        }
    }

    for key in SectionKey::ALL {
        let buf = plan.section_mut(key);
        let trimmed = buf.trim();
        *buf = if trimmed.is_empty() {
            key.placeholder()
        } else {
            trimmed.to_string()
        };
    }
    plan
}
