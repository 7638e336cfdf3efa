//! The `u<key>` User-Agent shortcut table.
//!
//! Each entry maps a short key (as written in a spec, e.g. `u firefox`)
//! to the full `User-Agent` header value it expands to.

/// `(key, user_agent_string)` pairs, checked in order by [`lookup`].
pub const UASTRINGS: &[(&str, &str)] = &[
    ("android", "Mozilla/5.0 (Linux; U; Android 4.1.1; en-gb; Build/KLP)"),
    ("bb", "Mozilla/5.0 (BlackBerry; U; BlackBerry 9900; en) AppleWebKit/534.11+"),
    ("chrome", "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2228.0 Safari/537.36"),
    ("firefox", "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:27.0) Gecko/20100101 Firefox/27.0"),
    ("ie9", "Mozilla/5.0 (Windows; U; MSIE 9.0; WIndows NT 9.0; en-US))"),
    ("ios", "Mozilla/5.0 (iPhone; CPU iPhone OS 6_1_4 like Mac OS X) AppleWebKit/536.26"),
    ("safari", "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_0) AppleWebKit/537.71 (KHTML, like Gecko) Version/7.0 Safari/537.71"),
];

/// Look up a shortcut key, case-sensitively, returning its expansion.
pub fn lookup(key: &str) -> Option<&'static str> {
    UASTRINGS.iter().find(|&&(k, _)| k == key).map(|&(_, v)| v)
}

/// All shortcut keys, longest first, so a parser trying literal
/// alternatives doesn't match a short key that is a prefix of a longer one.
pub fn keys_longest_first() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = UASTRINGS.iter().map(|&(k, _)| k).collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
    keys
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_known_key() {
        assert!(lookup("firefox").unwrap().contains("Firefox"));
    }

    #[test]
    fn lookup_unknown_key() {
        assert_eq!(lookup("nonexistent"), None);
    }
}
