use crate::validation::validate_email;

/// A parsed OpenPGP user ID.
///
/// Parsing never fails. A uid that doesn't hold a usable email address is
/// [`Uid::Invalid`] and carries no fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Uid {
    Valid(ValidUid),
    Invalid,
}

/// A user ID with a syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUid {
    name: Option<String>,
    comment: Option<String>,
    email: String,
}

impl Uid {
    /// Parses `Name (Comment) <email>`, `Name <email>` or a bare `email`.
    ///
    /// The forms are tried in that order. The first one that matches and
    /// whose email passes [`validate_email`] wins. A single trailing newline
    /// is ignored; any other newline makes the uid invalid.
    pub fn parse(uid: &str) -> Self {
        let uid = uid.strip_suffix('\n').unwrap_or(uid);
        let parsed = match_name_comment_email(uid)
            .filter(|m| validate_email(m.email))
            .or_else(|| match_name_email(uid).filter(|m| validate_email(m.email)))
            .or_else(|| match_bare_email(uid).filter(|m| validate_email(m.email)));

        match parsed {
            Some(m) => Uid::Valid(ValidUid {
                name: m.name.map(str::to_string),
                comment: m.comment.map(str::to_string),
                email: m.email.to_string(),
            }),
            None => Uid::Invalid,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Uid::Valid(_))
    }

    pub fn as_valid(&self) -> Option<&ValidUid> {
        match self {
            Uid::Valid(valid) => Some(valid),
            Uid::Invalid => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.as_valid().map(ValidUid::email)
    }

    pub fn email_line(&self) -> Option<String> {
        self.as_valid().map(ValidUid::email_line)
    }

    pub fn domain(&self) -> Option<&str> {
        self.as_valid().map(ValidUid::domain)
    }
}

impl ValidUid {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Everything after the first `@` of the email.
    pub fn domain(&self) -> &str {
        self.email
            .split_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or_default()
    }

    /// `Name <email>` when a name was given, otherwise the bare email.
    /// Comments are dropped.
    pub fn email_line(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} <{}>", self.email),
            None => self.email.clone(),
        }
    }
}

struct UidMatch<'a> {
    name: Option<&'a str>,
    comment: Option<&'a str>,
    email: &'a str,
}

/// `name (comment) <email>`: shortest name, then longest comment.
fn match_name_comment_email(uid: &str) -> Option<UidMatch<'_>> {
    if uid.contains('\n') {
        return None;
    }
    let inner = uid.strip_suffix('>')?;

    for (name_end, _) in uid.match_indices(" (") {
        let rest = &inner[name_end + 2..];
        let candidates: Vec<usize> = rest.match_indices(") <").map(|(i, _)| i).collect();

        for comment_end in candidates.into_iter().rev() {
            let email = &rest[comment_end + 3..];
            if looks_like_email(email) {
                return Some(UidMatch {
                    name: Some(&uid[..name_end]),
                    comment: Some(&rest[..comment_end]),
                    email,
                });
            }
        }
    }
    None
}

/// `name <email>`: shortest name.
fn match_name_email(uid: &str) -> Option<UidMatch<'_>> {
    if uid.contains('\n') {
        return None;
    }
    let inner = uid.strip_suffix('>')?;

    inner.match_indices(" <").find_map(|(name_end, _)| {
        let email = &inner[name_end + 2..];
        looks_like_email(email).then(|| UidMatch {
            name: Some(&uid[..name_end]),
            comment: None,
            email,
        })
    })
}

fn match_bare_email(uid: &str) -> Option<UidMatch<'_>> {
    (!uid.contains('\n') && looks_like_email(uid)).then_some(UidMatch {
        name: None,
        comment: None,
        email: uid,
    })
}

/// Something, `@`, something, `.`, something.
fn looks_like_email(candidate: &str) -> bool {
    let Some(at) = candidate
        .char_indices()
        .find(|&(i, c)| i > 0 && c == '@')
        .map(|(i, _)| i)
    else {
        return false;
    };

    let after_at = &candidate[at + 1..];
    let Some(first) = after_at.chars().next() else {
        return false;
    };
    let hostname_rest = &after_at[first.len_utf8()..];

    match hostname_rest.rfind('.') {
        Some(dot) => dot + 1 < hostname_rest.len(),
        None => false,
    }
}
