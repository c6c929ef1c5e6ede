use std::time::Duration;

pub struct UvPrompt {
    pub title: String,
    pub description: String,
    /// Upper bound requested by the relying party, if any.
    pub timeout: Option<Duration>,
}

pub(crate) fn make_credential_prompt(
    rp_id: &str,
    rp_name: Option<&str>,
    user_display: Option<&str>,
    timeout: Option<Duration>,
) -> UvPrompt {
    let site = match rp_name {
        Some(name) => format!("{name} ({rp_id})"),
        None => rp_id.to_string(),
    };
    let account = user_display.unwrap_or("(unknown)");
    UvPrompt {
        title: "fingergate".to_string(),
        description: format!(
            "Register biometric credential\n\nSite: {site}\nAccount: {account}\n\nEnter your PIN to create, or Cancel to deny."
        ),
        timeout,
    }
}

pub(crate) fn get_assertion_prompt(
    rp_id: &str,
    user_display: Option<&str>,
    timeout: Option<Duration>,
) -> UvPrompt {
    let account = user_display.unwrap_or("(unknown)");
    UvPrompt {
        title: "fingergate".to_string(),
        description: format!(
            "Sign in with biometric credential\n\nSite: {rp_id}\nAccount: {account}\n\nEnter your PIN to sign in, or Cancel to deny."
        ),
        timeout,
    }
}
