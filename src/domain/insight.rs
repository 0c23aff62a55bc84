use itertools::Itertools;
use serde::Serialize;

use super::score::{classify, MatchScore};

const DESCRIPTION_LIMIT: usize = 100;

/// Best-effort scrape of a company profile. A missing field means unknown.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CompanyData {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResult {
    company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logo_url: Option<String>,
    match_score: MatchScore,
    is_target: bool,
    additional_data: Vec<(String, String)>,
}

impl InsightResult {
    pub fn new(
        company_name: String,
        domain: Option<String>,
        logo_url: Option<String>,
        match_score: MatchScore,
        additional_data: Vec<(String, String)>,
    ) -> Self {
        InsightResult {
            company_name,
            domain,
            logo_url,
            match_score,
            is_target: classify(match_score),
            additional_data,
        }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }

    pub fn match_score(&self) -> MatchScore {
        self.match_score
    }

    pub fn is_target(&self) -> bool {
        self.is_target
    }

    pub fn additional_data(&self) -> &[(String, String)] {
        &self.additional_data
    }

    pub fn website(&self) -> Option<String> {
        self.domain.as_ref().map(|d| format!("https://{}", d))
    }
}

/// Domain guess for a company without an on-page website link.
pub fn guess_domain(company_name: &str) -> String {
    format!(
        "{}.com",
        company_name.to_lowercase().split_whitespace().join("-")
    )
}

pub fn truncate_description(description: Option<&str>) -> String {
    match description {
        None => "No description available".to_string(),
        Some(text) if text.chars().count() > DESCRIPTION_LIMIT => {
            format!("{}...", text.chars().take(DESCRIPTION_LIMIT).collect::<String>())
        }
        Some(text) => text.to_string(),
    }
}

/// `employeeCount` -> `Employee Count`
pub fn format_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            label.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            label.push(' ');
            label.push(c);
        } else {
            label.push(c);
        }
    }
    label.trim().to_string()
}
