//! Deterministic account email generation
//!
//! Every member account gets a unique address of the form
//! `{prefix}+{n}-{slug}@{domain}`, where `n` is the shared sequence number.
//! The address is a pure function of its inputs, so uniqueness reduces to
//! the monotonicity of the counter.

/// Maximum length of the sanitized name segment
const MAX_SLUG_LEN: usize = 60;

/// Normalize an account name for use in an email local-part.
///
/// Lowercases, maps anything outside `[a-z0-9-]` to `-`, collapses runs of
/// `-`, trims leading/trailing `-`, and caps the result at 60 characters.
pub fn sanitize_account_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = false;

    for c in name.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    let slug = slug.trim_matches('-');
    slug.chars().take(MAX_SLUG_LEN).collect()
}

/// Generate the unique email address for a new account.
pub fn generate_email(prefix: &str, unique_number: u64, account_name: &str, domain: &str) -> String {
    let slug = sanitize_account_name(account_name);
    format!("{prefix}+{unique_number}-{slug}@{domain}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_lowercases_and_dashes() {
        assert_eq!(sanitize_account_name("My Test Account"), "my-test-account");
        assert_eq!(sanitize_account_name("demo"), "demo");
        assert_eq!(sanitize_account_name("Data_Science#1"), "data-science-1");
    }

    #[test]
    fn sanitize_collapses_and_trims_dashes() {
        assert_eq!(sanitize_account_name("--a---b--"), "a-b");
        assert_eq!(sanitize_account_name("  spaced  out  "), "spaced-out");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_account_name(&long).len(), 60);
    }

    #[test]
    fn email_matches_expected_shape() {
        assert_eq!(
            generate_email("will", 5, "demo", "example.com"),
            "will+5-demo@example.com"
        );
    }

    #[test]
    fn email_is_deterministic() {
        let a = generate_email("ops", 42, "Data Science", "corp.io");
        let b = generate_email("ops", 42, "Data Science", "corp.io");
        assert_eq!(a, b);
        assert_eq!(a, "ops+42-data-science@corp.io");
    }

    #[test]
    fn distinct_counters_never_collide() {
        let emails: Vec<String> = (0..100)
            .map(|n| generate_email("ops", n, "same-name", "corp.io"))
            .collect();
        let mut deduped = emails.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), emails.len());
    }
}
