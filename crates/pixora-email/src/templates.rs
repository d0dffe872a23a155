// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Training status notification emails.

use pixora_core::TrainingStatus;
use pixora_core::types::EmailMessage;

/// Everything a training notification needs to know.
#[derive(Debug, Clone, Copy)]
pub struct TrainingNotice<'a> {
    pub to: &'a str,
    pub display_name: Option<&'a str>,
    pub model_name: &'a str,
    pub status: TrainingStatus,
    /// Public base URL, used for the call-to-action link.
    pub site_url: &'a str,
}

/// Builds the notification for `notice.status`. `Starting` has none.
pub fn training_status_email(notice: &TrainingNotice<'_>) -> Option<EmailMessage> {
    let model = escape_html(notice.model_name);
    let (subject, lead, cta) = match notice.status {
        TrainingStatus::Starting => return None,
        TrainingStatus::Processing => (
            format!("Training started for {}", notice.model_name),
            format!("Your model <strong>{model}</strong> is now training. We will email you again when it finishes."),
            None,
        ),
        TrainingStatus::Succeeded => (
            format!("{} is ready", notice.model_name),
            format!("Your model <strong>{model}</strong> finished training and is ready to generate images."),
            Some(("Start generating", "/image-generation")),
        ),
        TrainingStatus::Failed => (
            format!("Training failed for {}", notice.model_name),
            format!("Training for <strong>{model}</strong> failed. Check your training images and try again."),
            Some(("Try again", "/model-training")),
        ),
        TrainingStatus::Canceled => (
            format!("Training canceled for {}", notice.model_name),
            format!("Training for <strong>{model}</strong> was canceled."),
            None,
        ),
    };

    let greeting = match notice.display_name {
        Some(name) if !name.trim().is_empty() => format!("Hi {},", escape_html(name)),
        _ => "Hi,".to_string(),
    };
    let mut html = format!("<p>{greeting}</p><p>{lead}</p>");
    if let Some((label, route)) = cta {
        let href = format!("{}{route}", notice.site_url.trim_end_matches('/'));
        html.push_str(&format!(
            r#"<p><a href="{}">{label}</a></p>"#,
            escape_html(&href)
        ));
    }
    html.push_str("<p>The Pixora team</p>");

    Some(EmailMessage {
        to: vec![notice.to.to_string()],
        subject,
        html,
    })
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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
