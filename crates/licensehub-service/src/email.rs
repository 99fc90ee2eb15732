//! E-mail address validation shared by purchases, trials and grants.

use validator::ValidateEmail;

/// RFC 5321 limit on the length of an address.
const MAX_EMAIL_LEN: usize = 254;

/// Frequent domain misspellings and their intended domain.
const DOMAIN_TYPOS: &[(&str, &str)] = &[
    ("gmail.co", "gmail.com"),
    ("gmail.cm", "gmail.com"),
    ("gmial.com", "gmail.com"),
    ("yahooo.com", "yahoo.com"),
    ("hotmial.com", "hotmail.com"),
];

/// Validate an address and return it trimmed and lower-cased.
///
/// The error is a message suitable for showing to the user, including a
/// "Did you mean ...?" suggestion for common domain typos.
pub fn normalize_email(raw: &str) -> Result<String, String> {
    let email = raw.trim().to_lowercase();

    if email.is_empty() {
        return Err("Email address is required".to_string());
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err("Email address too long".to_string());
    }

    let domain = match email.rsplit_once('@') {
        Some((_, domain)) => domain,
        None => return Err("Invalid email format".to_string()),
    };
    if !email.validate_email() || !domain.contains('.') {
        return Err("Invalid email format".to_string());
    }

    if let Some((_, intended)) = DOMAIN_TYPOS.iter().find(|(typo, _)| *typo == domain) {
        let local = &email[..email.len() - domain.len()];
        return Err(format!("Did you mean {local}{intended}?"));
    }

    Ok(email)
}

/// Mask an address for logs: `jo***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{visible}***@{domain}")
        }
        None => "***".to_string(),
    }
}
