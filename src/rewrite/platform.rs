//! Platform classification and the built-in Android/iOS rule sets.

use crate::rewrite::rules::{RewriteError, RewriteRule, RuleSet};

/// Best-effort guess of whether a request came from an Android client.
///
/// Heuristic: false negatives serve iOS-flavoured content, false positives
/// rewrite a genuine iOS response.
pub fn is_android(user_agent: &str, url: &str) -> bool {
    user_agent.to_ascii_lowercase().contains("android")
        || url.contains("platform=android")
        || url.contains("_android.json")
}

/// Outbound body rules: every "android", any case, becomes "ios".
pub fn request_rules() -> Result<RuleSet, RewriteError> {
    Ok(RuleSet::new(vec![RewriteRule::literal("android", "ios", true)?]))
}

/// Rules turning iOS-flavoured response text back into Android terms.
pub fn response_rules() -> Result<RuleSet, RewriteError> {
    Ok(RuleSet::new(vec![
        RewriteRule::literal("_ios.json", "_android.json", false)?,
        RewriteRule::literal("iphone os", "Android", true)?,
        RewriteRule::literal("ipad", "Pixel 6", true)?,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_android_user_agent() {
        assert!(is_android("Dalvik/2.1.0 (Linux; U; Android 13; Pixel 6)", "/"));
        assert!(is_android("UnityPlayer ANDROID", "/"));
        assert!(!is_android("BlockCity/1.0 CFNetwork Darwin", "/bcw3d"));
    }

    #[test]
    fn test_android_url_markers() {
        assert!(is_android("", "/config?platform=android&v=2"));
        assert!(is_android("", "/skins/skin_android.json"));
        assert!(!is_android("", "/config?platform=ios"));
        // Query markers are matched as written.
        assert!(!is_android("", "/config?platform=ANDROID"));
    }

    #[test]
    fn test_request_rules() {
        let rules = request_rules().unwrap();
        assert_eq!(
            rules.apply(r#"{"os":"Android","build":"android-13"}"#),
            r#"{"os":"ios","build":"ios-13"}"#
        );
    }

    #[test]
    fn test_response_rules() {
        let rules = response_rules().unwrap();
        assert_eq!(
            rules.apply(r#"{"cfg":"shop_ios.json","os":"iPhone OS 16","dev":"iPad8,1"}"#),
            r#"{"cfg":"shop_android.json","os":"Android 16","dev":"Pixel 68,1"}"#
        );
    }

    #[test]
    fn test_response_rules_are_substring_specific() {
        let rules = response_rules().unwrap();
        let body = r#"{"file":"skin_android.json"}"#;
        assert_eq!(rules.rewrite_bytes(body.as_bytes()).unwrap(), None);
    }
}
