//! Server-rendered pages: homepage and the detection form

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::Html,
    Form,
};
use validator::Validate;

use crate::AppState;
use crate::error::describe_validation;
use crate::inference::ClassifyError;
use crate::models::{FlowFeatures, Verdict, FORM_COLUMNS};

const STYLE: &str = r#"
body { color: #1E1E1E; background-color: #E6E6FA; font-family: sans-serif; margin: 0; }
nav { background-color: #9370DB; padding: 0.75rem 1.5rem; }
nav a { color: #FFFFFF; margin-right: 1.5rem; text-decoration: none; font-weight: bold; }
main { max-width: 60rem; margin: 0 auto; padding: 1.5rem; }
h1, h2 { color: #8A2BE2; }
.columns { display: flex; gap: 1.5rem; }
.column { flex: 1; }
label { display: block; margin-top: 0.75rem; font-size: 0.9rem; }
input[type=number] { width: 100%; padding: 0.3rem; }
button { margin-top: 1.25rem; padding: 0.5rem 2rem; background: #9370DB; color: #FFF; border: 0; }
.alert { margin-top: 1.25rem; padding: 0.9rem; border-radius: 0.3rem; }
.alert-success { color: green; background: #d4edda; }
.alert-attack { color: #721c24; background: #f8d7da; }
.alert-invalid { color: #856404; background: #fff3cd; }
"#;

/// Banner shown under the form
enum Outcome {
    Verdict(Verdict),
    Invalid(String),
    Failed,
}

// ============================================================================
// HANDLERS
// ============================================================================

pub async fn home() -> Html<String> {
    let body = "<h1>Detection of Cyberattacks in IoMT networks</h1>\
        <p>Detecting cyberattacks in the networks of the Internet of Medical Things (IoMT) is crucial, \
        given the sensitivity of healthcare data and the potential impacts of cyberattacks on medical networks. \
        This web application is created for educational purposes to demonstrate the detection of cyberattacks in IoMT networks.</p>\
        <p>Welcome to the IoMT Cyberattacks Detection Application.</p>\
        <p>Use the navigation bar to open the <a href=\"/detect\"><em>Detection</em></a> page.</p>";
    Html(layout(body))
}

pub async fn detect_form() -> Html<String> {
    Html(render_detect(&FlowFeatures::default(), None))
}

pub async fn detect_submit(
    State(state): State<AppState>,
    form: Result<Form<FlowFeatures>, FormRejection>,
) -> (StatusCode, Html<String>) {
    let flow = match form {
        Ok(Form(flow)) => flow,
        Err(rejection) => {
            tracing::debug!("Rejected detection form: {}", rejection.body_text());
            let outcome = Outcome::Invalid(rejection.body_text());
            return (StatusCode::BAD_REQUEST, Html(render_detect(&FlowFeatures::default(), Some(outcome))));
        }
    };

    if let Err(errors) = flow.validate() {
        let outcome = Outcome::Invalid(describe_validation(&errors));
        return (StatusCode::BAD_REQUEST, Html(render_detect(&flow, Some(outcome))));
    }

    let (status, outcome) = match state.classifier.classify_flow(&flow) {
        Ok(verdict) => (StatusCode::OK, Outcome::Verdict(verdict)),
        Err(ClassifyError::InvalidFeatures(e)) => (StatusCode::BAD_REQUEST, Outcome::Invalid(e.to_string())),
        Err(ClassifyError::Predict(e)) => {
            tracing::error!("Prediction failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Outcome::Failed)
        }
    };

    (status, Html(render_detect(&flow, Some(outcome))))
}

// ============================================================================
// RENDERING
// ============================================================================

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>Detection of IoMT Cyberattacks</title><style>{}</style></head>\
         <body><nav><a href=\"/\">Homepage</a><a href=\"/detect\">Detection</a></nav>\
         <main>{}</main></body></html>",
        STYLE, body
    )
}

fn render_detect(flow: &FlowFeatures, outcome: Option<Outcome>) -> String {
    let mut body = String::from(
        "<h1>IoMT Traffic Classification</h1>\
         <h2>Customize Parameters for Cyberattack Detection in IoMT networks</h2><hr>\
         <form method=\"post\" action=\"/detect\"><div class=\"columns\">",
    );

    for column in FORM_COLUMNS.iter() {
        body.push_str("<div class=\"column\">");
        for (name, label) in column.iter() {
            let value = flow.get(name).unwrap_or(0.0);
            body.push_str(&format!(
                "<label for=\"{name}\">{label}</label>\
                 <input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"0\" step=\"any\" value=\"{value}\" required>"
            ));
        }
        body.push_str("</div>");
    }
    body.push_str("</div><button type=\"submit\">Detect</button></form>");

    match outcome {
        Some(Outcome::Verdict(verdict)) => {
            let class = if verdict.is_attack { "alert-attack" } else { "alert-success" };
            body.push_str(&format!("<div class=\"alert {}\" role=\"alert\">{}</div>", class, verdict.category));
        }
        Some(Outcome::Invalid(reason)) => {
            body.push_str(&format!(
                "<div class=\"alert alert-invalid\" role=\"alert\">Invalid input: {}</div>",
                escape_html(&reason)
            ));
        }
        Some(Outcome::Failed) => {
            body.push_str("<div class=\"alert alert-attack\" role=\"alert\">Detection failed, see server logs.</div>");
        }
        None => {}
    }

    layout(&body)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
