use uuid::Uuid;

use super::insight::{CompanyData, InsightResult};

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetContent {
    Loading,
    Ready(InsightResult),
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetAction {
    InsightsLoaded(InsightResult),
    FetchFailed,
    Retry,
    Hide,
    Show,
}

/// Side effects a transition asks the controller to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchInsights {
        company_name: String,
        page_domain: Option<String>,
    },
    PersistVisibility(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    pub id: Uuid,
    pub page_key: String,
    pub company_name: Option<String>,
    pub page_domain: Option<String>,
    pub content: WidgetContent,
    pub visible: bool,
}

impl WidgetState {
    /// absent -> loading. A widget is hidden from the start when the
    /// persisted flag says so.
    pub fn initialize(
        page_key: String,
        company: &CompanyData,
        page_domain: Option<String>,
        persisted_visible: Option<bool>,
    ) -> (Self, Vec<Effect>) {
        let state = WidgetState {
            id: Uuid::new_v4(),
            page_key,
            company_name: company.name.clone(),
            page_domain,
            content: WidgetContent::Loading,
            visible: persisted_visible.unwrap_or(true),
        };

        let effects = state.fetch_effect().into_iter().collect();
        (state, effects)
    }

    pub fn apply(self, action: WidgetAction) -> (Self, Vec<Effect>) {
        let loading = matches!(self.content, WidgetContent::Loading);

        match action {
            WidgetAction::InsightsLoaded(insight) if loading => (
                WidgetState {
                    content: WidgetContent::Ready(insight),
                    ..self
                },
                vec![],
            ),
            WidgetAction::FetchFailed if loading => (
                WidgetState {
                    content: WidgetContent::Failed,
                    ..self
                },
                vec![],
            ),
            WidgetAction::Retry if !loading => match self.fetch_effect() {
                Some(effect) => (
                    WidgetState {
                        content: WidgetContent::Loading,
                        ..self
                    },
                    vec![effect],
                ),
                None => (self, vec![]),
            },
            WidgetAction::Hide => (
                WidgetState {
                    visible: false,
                    ..self
                },
                vec![Effect::PersistVisibility(false)],
            ),
            WidgetAction::Show => (
                WidgetState {
                    visible: true,
                    ..self
                },
                vec![Effect::PersistVisibility(true)],
            ),
            action => {
                log::info!(
                    "Ignoring {:?} for widget {} in state {:?}",
                    action,
                    self.id,
                    self.content
                );
                (self, vec![])
            }
        }
    }

    pub fn insight(&self) -> Option<&InsightResult> {
        match &self.content {
            WidgetContent::Ready(insight) => Some(insight),
            _ => None,
        }
    }

    fn fetch_effect(&self) -> Option<Effect> {
        self.company_name
            .as_ref()
            .filter(|name| !name.is_empty())
            .map(|name| Effect::FetchInsights {
                company_name: name.clone(),
                page_domain: self.page_domain.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{
        insight::{CompanyData, InsightResult},
        score::MatchScore,
    };

    use super::{Effect, WidgetAction, WidgetContent, WidgetState};

    fn company(name: Option<&str>) -> CompanyData {
        CompanyData {
            name: name.map(str::to_string),
            ..Default::default()
        }
    }

    fn insight() -> InsightResult {
        InsightResult::new("Acme".into(), None, None, MatchScore::new(80), vec![])
    }

    fn loading() -> WidgetState {
        WidgetState::initialize(
            "https://www.linkedin.com/company/acme/".into(),
            &company(Some("Acme")),
            Some("acme.io".into()),
            None,
        )
        .0
    }

    #[test]
    fn initialize_requests_fetch_for_named_company() {
        let (state, effects) = WidgetState::initialize(
            "page".into(),
            &company(Some("Acme")),
            Some("acme.io".into()),
            None,
        );

        assert_eq!(state.content, WidgetContent::Loading);
        assert!(state.visible);
        assert_eq!(
            effects,
            vec![Effect::FetchInsights {
                company_name: "Acme".into(),
                page_domain: Some("acme.io".into()),
            }]
        );
    }

    #[test]
    fn initialize_without_name_does_not_fetch() {
        let (state, effects) = WidgetState::initialize("page".into(), &company(None), None, None);

        assert_eq!(state.content, WidgetContent::Loading);
        assert!(effects.is_empty());
    }

    #[test]
    fn initialize_applies_persisted_hidden_flag() {
        let (state, _) =
            WidgetState::initialize("page".into(), &company(Some("Acme")), None, Some(false));
        assert!(!state.visible);
    }

    #[test]
    fn loading_to_ready() {
        let (state, effects) = loading().apply(WidgetAction::InsightsLoaded(insight()));

        assert_eq!(state.insight(), Some(&insight()));
        assert!(effects.is_empty());
    }

    #[test]
    fn failed_then_retry_fetches_same_company() {
        let (failed, _) = loading().apply(WidgetAction::FetchFailed);
        assert_eq!(failed.content, WidgetContent::Failed);

        let (retrying, effects) = failed.apply(WidgetAction::Retry);
        assert_eq!(retrying.content, WidgetContent::Loading);
        assert_eq!(
            effects,
            vec![Effect::FetchInsights {
                company_name: "Acme".into(),
                page_domain: Some("acme.io".into()),
            }]
        );
    }

    #[test]
    fn retry_while_loading_is_ignored() {
        let before = loading();
        let (after, effects) = before.clone().apply(WidgetAction::Retry);

        assert_eq!(after, before);
        assert!(effects.is_empty());
    }

    #[test]
    fn late_result_after_ready_is_ignored() {
        let (ready, _) = loading().apply(WidgetAction::InsightsLoaded(insight()));
        let (after, _) = ready.clone().apply(WidgetAction::FetchFailed);

        assert_eq!(after, ready);
    }

    #[test]
    fn toggling_twice_restores_visibility() {
        let start = loading();
        let (hidden, first) = start.clone().apply(WidgetAction::Hide);
        let (shown, second) = hidden.apply(WidgetAction::Show);

        assert_eq!(first, vec![Effect::PersistVisibility(false)]);
        assert_eq!(second, vec![Effect::PersistVisibility(true)]);
        assert_eq!(shown.visible, start.visible);
        assert_eq!(shown.content, start.content);
    }
}
