//! Privilege and user detection.

/// True when the process runs as root (effective uid 0).
pub fn has_elevated_privilege() -> bool {
    #[cfg(target_os = "linux")]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

/// Login name of the invoking user, title-cased for display.
pub fn current_user_display_name() -> String {
    let raw = ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "user".to_string());
    title_case(&raw)
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("derek"), "Derek");
        assert_eq!(title_case("JOHN_doe"), "John_Doe");
        assert_eq!(title_case("anna-maria2x"), "Anna-Maria2X");
    }
}
