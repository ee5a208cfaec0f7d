//! Deterministic rendering of action-token notification mail.
//!
//! The token travels in the URL hash fragment so intermediate servers never
//! see it in access logs. Actions are listed in canonical flag order so the
//! same token always renders the same body.

use crate::auth::action_token::ActionToken;

/// Render the (subject, body) pair for an action-token notification.
pub fn render_action_mail(token: &ActionToken, base_url: &str) -> (String, String) {
    let actions = token.actions.to_list();

    let subject = match actions.as_slice() {
        [single] => format!("Action required: {}", single.label()),
        _ => "Action required on your account".to_string(),
    };

    let action_url = format!("{}/account/actions#token={}", base_url.trim_end_matches('/'), token.token);

    let mut body = String::from("Hello,\n\nPlease follow the link below to:\n");
    for action in &actions {
        body.push_str("  - ");
        body.push_str(action.label());
        body.push('\n');
    }
    body.push('\n');
    body.push_str(&action_url);
    body.push('\n');

    if let Some(expires_at) = token.expires_at {
        body.push_str(&format!(
            "\nThis link expires on {}.\n",
            expires_at.format("%Y-%m-%d %H:%M UTC")
        ));
    }

    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::action_type::ActionType;
    use chrono::{Duration, Utc};

    fn token(actions: ActionType, expires: bool) -> ActionToken {
        ActionToken {
            token: "opaque-token".to_string(),
            actions,
            email: "new@example.com".to_string(),
            user_id: None,
            roles: vec![],
            created_at: Utc::now(),
            expires_at: expires.then(|| Utc::now() + Duration::hours(24)),
        }
    }

    #[test]
    fn single_action_subject_names_the_action() {
        let (subject, body) = render_action_mail(&token(ActionType::RESET_PASSWORD, false), "https://id.example.com");
        assert_eq!(subject, "Action required: reset your password");
        assert!(body.contains("https://id.example.com/account/actions#token=opaque-token"));
    }

    #[test]
    fn combined_actions_render_in_canonical_order() {
        let (_, body) = render_action_mail(
            &token(ActionType::ACCEPT_TERMS | ActionType::VALIDATE_EMAIL, false),
            "https://id.example.com",
        );

        let email_pos = body.find("validate your email address").unwrap();
        let terms_pos = body.find("accept the terms of service").unwrap();
        assert!(email_pos < terms_pos);
    }

    #[test]
    fn trailing_slash_in_base_url_is_tolerated() {
        let (_, body) = render_action_mail(&token(ActionType::INVITE, false), "https://id.example.com/");
        assert!(body.contains("https://id.example.com/account/actions#token="));
        assert!(!body.contains(".com//account"));
    }

    #[test]
    fn expiry_is_mentioned_when_set() {
        let (_, body) = render_action_mail(&token(ActionType::INVITE, true), "https://id.example.com");
        assert!(body.contains("expires on"));

        let (_, body) = render_action_mail(&token(ActionType::INVITE, false), "https://id.example.com");
        assert!(!body.contains("expires on"));
    }
}
