use scraper::{Html, Selector};
use url::Url;

use super::insight::CompanyData;

const COMPANY_PATH_MARKER: &str = "/company/";
const REDIRECT_PATH_PREFIX: &str = "/redir";
const REDIRECT_TARGET_PARAM: &str = "url";

const COMPANY_LANDMARKS: [&str; 2] = [".org-top-card", "[data-test-id='topcard-entity-name']"];

const NAME_SELECTORS: [&str; 5] = [
    ".org-top-card-summary__title",
    ".org-top-card-primary-content__title",
    "[data-test-id='topcard-entity-name']",
    ".org-company-card__primary-name",
    ".org-page-title",
];
const INDUSTRY_SELECTORS: [&str; 2] = [
    ".company-industries",
    ".org-about-company-module__industry",
];
const SIZE_SELECTORS: [&str; 2] = [
    ".org-about-company-module__company-staff-count-range",
    ".org-about-company-module__company-size-definition-text",
];
const LOCATION_SELECTORS: [&str; 2] = [
    ".org-top-card-summary__headquarter",
    ".org-about-module__headquarters",
];
const WEBSITE_SELECTORS: [&str; 3] = [
    r#"a[data-control-name="visit_website"]"#,
    r#"a[data-test-id="visit-website-button"]"#,
    r#"a.link-without-hover-state[href*="linkedin.com/redir"]"#,
];

/// A submitted host page: its location and parsed document.
pub struct HostPage {
    url: Url,
    document: Html,
}

impl HostPage {
    pub fn parse(url: &str, html: &str) -> anyhow::Result<Self> {
        let url = Url::parse(url)?;
        Ok(HostPage {
            url,
            document: Html::parse_document(html),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Page URL without query or fragment.
    pub fn page_key(&self) -> String {
        let mut key = self.url.clone();
        key.set_query(None);
        key.set_fragment(None);
        key.to_string()
    }

    pub fn is_company_page(&self) -> bool {
        self.url.path().contains(COMPANY_PATH_MARKER)
            || COMPANY_LANDMARKS
                .iter()
                .filter_map(|s| parse_selector(s))
                .any(|selector| self.document.select(&selector).next().is_some())
    }

    pub fn extract_company_data(&self) -> CompanyData {
        CompanyData {
            name: self.first_text(&NAME_SELECTORS),
            industry: self.first_text(&INDUSTRY_SELECTORS),
            size: self.first_text(&SIZE_SELECTORS),
            location: self.first_text(&LOCATION_SELECTORS),
        }
    }

    /// Hostname behind the page's "visit website" link, if any.
    pub fn website_domain(&self) -> Option<String> {
        let anchor_href = WEBSITE_SELECTORS
            .iter()
            .filter_map(|s| parse_selector(s))
            .find_map(|selector| {
                self.document
                    .select(&selector)
                    .next()
                    .map(|anchor| anchor.value().attr("href").map(str::to_string))
            })?;

        // An anchor without href resolves to nothing, not to the page itself
        let href = anchor_href?;
        resolve_website_href(&self.url, &href)
    }

    fn first_text(&self, selectors: &[&str]) -> Option<String> {
        selectors
            .iter()
            .filter_map(|s| parse_selector(s))
            .find_map(|selector| {
                self.document
                    .select(&selector)
                    .next()
                    .map(|element| element.text().collect::<String>().trim().to_string())
            })
            .filter(|text| !text.is_empty())
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            log::error!("Skipping unparsable selector {}: {:?}", selector, e);
            None
        }
    }
}

/// Resolves an anchor href to the destination hostname, unwrapping a
/// `/redir?url=...` wrapper when present. A `/redir` path without a `url`
/// parameter is an ordinary link.
pub fn resolve_website_href(page_url: &Url, href: &str) -> Option<String> {
    let parsed = match page_url.join(href) {
        Ok(url) => url,
        Err(e) => {
            log::error!("Unparsable website href {}: {:?}", href, e);
            return None;
        }
    };

    let redirect_target = match parsed.path().starts_with(REDIRECT_PATH_PREFIX) {
        true => parsed
            .query_pairs()
            .find(|(key, _)| key == REDIRECT_TARGET_PARAM)
            .map(|(_, value)| value.into_owned()),
        false => None,
    };

    let destination = match redirect_target {
        Some(target) => match Url::parse(&target) {
            Ok(url) => url,
            Err(e) => {
                log::error!("Unparsable redirect target {}: {:?}", target, e);
                return None;
            }
        },
        None => parsed,
    };

    match destination.host_str() {
        Some("") | None => None,
        Some(host) => Some(host.to_string()),
    }
}
