use actix_web::{get, http::header, post, web, HttpResponse};
use askama::Template;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    domain::{
        insight::format_label,
        page::HostPage,
        widget::{WidgetAction, WidgetContent, WidgetState},
    },
    services::PageSnapshot,
    startup::Controller,
};

#[derive(Template)]
#[template(path = "widget.html")]
struct WidgetTemplate {
    id: String,
    visible: bool,
    is_loading: bool,
    is_failed: bool,
    company_name: String,
    logo_url: Option<String>,
    match_score: u8,
    is_target: bool,
    details: Vec<(String, String)>,
    website: Option<String>,
}

impl From<&WidgetState> for WidgetTemplate {
    fn from(state: &WidgetState) -> Self {
        let scraped_name = state
            .company_name
            .clone()
            .unwrap_or("Loading company data...".to_string());

        let template = WidgetTemplate {
            id: state.id.to_string(),
            visible: state.visible,
            is_loading: false,
            is_failed: false,
            company_name: scraped_name,
            logo_url: None,
            match_score: 0,
            is_target: false,
            details: vec![],
            website: None,
        };

        match &state.content {
            WidgetContent::Loading => WidgetTemplate {
                is_loading: true,
                ..template
            },
            WidgetContent::Failed => WidgetTemplate {
                is_failed: true,
                ..template
            },
            WidgetContent::Ready(insight) => WidgetTemplate {
                company_name: insight.company_name().to_string(),
                logo_url: insight.logo_url().map(str::to_string),
                match_score: insight.match_score().value(),
                is_target: insight.is_target(),
                details: insight
                    .additional_data()
                    .iter()
                    .map(|(key, value)| (format_label(key), value.clone()))
                    .collect(),
                website: insight.website(),
                ..template
            },
        }
    }
}

#[derive(Deserialize)]
struct MountWidgetBody {
    url: String,
    html: String,
}

#[derive(Deserialize)]
struct WidgetActionForm {
    action: String,
}

#[post("")]
pub async fn mount_widget(
    body: web::Json<MountWidgetBody>,
    controller: web::Data<Controller>,
) -> HttpResponse {
    let snapshot = match read_company_page(&body.url, &body.html) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return HttpResponse::NoContent().finish(),
        Err(e) => {
            log::error!("Rejecting page {}: {:?}", body.url, e);
            return HttpResponse::BadRequest().body(format!("Invalid page: {}", e));
        }
    };

    let controller = controller.into_inner();
    match web::block(move || controller.mount(snapshot)).await {
        Ok(Ok(transition)) => render(&transition.state),
        Ok(Err(e)) => {
            log::error!("Failed to mount widget: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
        Err(e) => {
            log::error!("Mount task failed: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/{id}")]
pub async fn get_widget(id: web::Path<Uuid>, controller: web::Data<Controller>) -> HttpResponse {
    match controller.get(id.into_inner()) {
        Ok(Some(state)) => render(&state),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => {
            log::error!("Failed to read widget: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/{id}/insight")]
pub async fn get_insight(id: web::Path<Uuid>, controller: web::Data<Controller>) -> HttpResponse {
    match controller.get(id.into_inner()) {
        Ok(Some(state)) => match state.insight() {
            Some(insight) => HttpResponse::Ok().json(insight),
            None => HttpResponse::NotFound().body("Insights not loaded"),
        },
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => {
            log::error!("Failed to read widget: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/{id}/action")]
pub async fn dispatch_action(
    id: web::Path<Uuid>,
    form: web::Form<WidgetActionForm>,
    controller: web::Data<Controller>,
) -> HttpResponse {
    let id = id.into_inner();
    let action = match form.action.as_str() {
        "retry" => WidgetAction::Retry,
        "hide" => WidgetAction::Hide,
        "show" => WidgetAction::Show,
        other => return HttpResponse::BadRequest().body(format!("Unknown action: {}", other)),
    };

    let controller = controller.into_inner();
    match web::block(move || controller.dispatch(id, action)).await {
        Ok(Ok(Some(_))) => HttpResponse::SeeOther()
            .insert_header((header::LOCATION, format!("/widget/{}", id)))
            .finish(),
        Ok(Ok(None)) => HttpResponse::NotFound().finish(),
        Ok(Err(e)) => {
            log::error!("Failed to dispatch {} to widget {}: {:?}", form.action, id, e);
            HttpResponse::InternalServerError().finish()
        }
        Err(e) => {
            log::error!("Dispatch task for widget {} failed: {:?}", id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn read_company_page(url: &str, html: &str) -> anyhow::Result<Option<PageSnapshot>> {
    let page = HostPage::parse(url, html)?;
    if !page.is_company_page() {
        log::info!("Not a company page: {}", url);
        return Ok(None);
    }

    Ok(Some(PageSnapshot {
        page_key: page.page_key(),
        company: page.extract_company_data(),
        page_domain: page.website_domain(),
    }))
}

fn render(state: &WidgetState) -> HttpResponse {
    match WidgetTemplate::from(state).render() {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(e) => {
            log::error!("Failed to render widget {}: {:?}", state.id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use actix_web::{
        http::{header, StatusCode},
        test, web, App,
    };
    use serde_json::json;

    use crate::{
        services::{EnrichmentClient, InsightFetcher, MemoryStore},
        startup::{widget_scope, Controller},
    };

    const COMPANY_PAGE: &str = r#"
        <div class="org-top-card">
            <h1 class="org-top-card-summary__title">Acme Corp</h1>
        </div>
    "#;

    fn controller() -> web::Data<Controller> {
        // Nothing listens on the discard port, so every probe fails fast.
        let client = EnrichmentClient::new(
            "http://127.0.0.1:9".to_string(),
            "http://127.0.0.1:9".to_string(),
            "test-key".to_string(),
        );
        web::Data::new(Controller::new(
            Arc::new(MemoryStore::new()),
            InsightFetcher::new(client),
            16,
        ))
    }

    fn mount_request(url: &str, html: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/widget")
            .set_json(json!({ "url": url, "html": html }))
    }

    fn widget_id(body: &str) -> String {
        let start = body.find("data-widget-id=\"").unwrap() + "data-widget-id=\"".len();
        body[start..start + 36].to_string()
    }

    #[actix_web::test]
    async fn non_company_page_gets_no_widget() {
        let app = test::init_service(App::new().service(widget_scope(controller()))).await;
        let res = test::call_service(
            &app,
            mount_request("https://www.linkedin.com/feed/", "<p>feed</p>").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn invalid_url_is_rejected() {
        let app = test::init_service(App::new().service(widget_scope(controller()))).await;
        let res =
            test::call_service(&app, mount_request("not a url", COMPANY_PAGE).to_request()).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn company_page_renders_loading_then_insights() {
        let app = test::init_service(App::new().service(widget_scope(controller()))).await;
        let body = test::call_and_read_body(
            &app,
            mount_request("https://www.linkedin.com/company/acme/", COMPANY_PAGE).to_request(),
        )
        .await;
        let body = String::from_utf8(body.to_vec()).unwrap();

        assert!(body.contains("Acme Corp"));
        assert!(body.contains("Fetching insights..."));

        let id = widget_id(&body);
        let mut rendered = String::new();
        for _ in 0..100 {
            let req = test::TestRequest::get()
                .uri(&format!("/widget/{}", id))
                .to_request();
            let body = test::call_and_read_body(&app, req).await;
            rendered = String::from_utf8(body.to_vec()).unwrap();
            if rendered.contains("Match Score") {
                break;
            }
            actix_web::rt::time::sleep(Duration::from_millis(20)).await;
        }

        // The logo probe cannot succeed, so this is the synthetic fallback.
        assert!(rendered.contains("Match Score"));
        assert!(rendered.contains("Limited data available"));
        assert!(!rendered.contains("Visit Website"));
    }

    #[actix_web::test]
    async fn mounting_twice_returns_same_widget() {
        let app = test::init_service(App::new().service(widget_scope(controller()))).await;
        let url = "https://www.linkedin.com/company/acme/";

        let first =
            test::call_and_read_body(&app, mount_request(url, COMPANY_PAGE).to_request()).await;
        let second = test::call_and_read_body(
            &app,
            mount_request(&format!("{}?trk=nav", url), COMPANY_PAGE).to_request(),
        )
        .await;

        assert_eq!(
            widget_id(std::str::from_utf8(&first).unwrap()),
            widget_id(std::str::from_utf8(&second).unwrap())
        );
    }

    #[actix_web::test]
    async fn hide_action_redirects_and_hides() {
        let app = test::init_service(App::new().service(widget_scope(controller()))).await;
        let body = test::call_and_read_body(
            &app,
            mount_request("https://www.linkedin.com/company/acme/", COMPANY_PAGE).to_request(),
        )
        .await;
        let id = widget_id(std::str::from_utf8(&body).unwrap());

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/widget/{}/action", id))
                .set_form([("action", "hide")])
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get(header::LOCATION).unwrap(),
            &format!("/widget/{}", id)
        );

        let rendered = test::call_and_read_body(
            &app,
            test::TestRequest::get()
                .uri(&format!("/widget/{}", id))
                .to_request(),
        )
        .await;
        let rendered = std::str::from_utf8(&rendered).unwrap();
        assert!(rendered.contains("company-insights-widget hidden"));
        assert!(rendered.contains("class=\"toggle-button\""));
    }

    #[actix_web::test]
    async fn unknown_action_is_rejected() {
        let app = test::init_service(App::new().service(widget_scope(controller()))).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/widget/{}/action", uuid::Uuid::new_v4()))
                .set_form([("action", "explode")])
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_widget_is_not_found() {
        let app = test::init_service(App::new().service(widget_scope(controller()))).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/widget/{}", uuid::Uuid::new_v4()))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
