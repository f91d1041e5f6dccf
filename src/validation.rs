/// Roughly validates an email address by checking its hostname.
///
/// Splits once on the first `@` and hands everything after it to
/// [`validate_hostname`]. This is syntax only: it says nothing about
/// whether mail to the address would be delivered.
pub fn validate_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((_, hostname)) => validate_hostname(hostname),
        None => false,
    }
}

/// Validates hostname syntax.
///
/// Rules:
/// - At most 255 characters
/// - At most one trailing `.` is ignored
/// - Every label is 1-63 characters of `A-Z`, `a-z`, `0-9` or `-`, and
///   does not start or end with `-`
/// - `.onion` hostnames are rejected; they are unreachable by ordinary mail
pub fn validate_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 255 {
        return false;
    }

    let hostname = hostname.strip_suffix('.').unwrap_or(hostname);
    let labels: Vec<&str> = hostname.split('.').collect();

    if labels.last().is_some_and(|tld| *tld == "onion") {
        return false;
    }

    labels.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
    (1..=63).contains(&label.len())
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}
