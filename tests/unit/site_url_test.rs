//! Unit tests for base URL resolution and auth redirect targets.

use rstest::rstest;

use linkshelf::services::site_url::{
    auth_callback_url, auth_redirect, resolve_base_url, safe_next_path, UrlSources,
};

fn sources(
    configured: Option<&str>,
    forwarded_host: Option<&str>,
    forwarded_proto: Option<&str>,
    deployment_host: Option<&str>,
) -> UrlSources {
    UrlSources {
        configured: configured.map(str::to_string),
        forwarded_host: forwarded_host.map(str::to_string),
        forwarded_proto: forwarded_proto.map(str::to_string),
        deployment_host: deployment_host.map(str::to_string),
    }
}

#[rstest]
#[case(sources(Some("https://shelf.example.com/"), Some("proxy.local"), None, Some("dep.example")), "https://shelf.example.com")]
#[case(sources(Some("https://shelf.example.com"), None, None, None), "https://shelf.example.com")]
#[case(sources(None, Some("app.example.com"), Some("http"), Some("dep.example")), "http://app.example.com")]
#[case(sources(None, Some("app.example.com"), None, None), "https://app.example.com")]
#[case(sources(None, None, None, Some("linkshelf-abc.example.app")), "https://linkshelf-abc.example.app")]
#[case(sources(None, None, None, None), "http://localhost:3000")]
fn test_resolve_base_url_priority(#[case] input: UrlSources, #[case] expected: &str) {
    assert_eq!(resolve_base_url(&input), expected);
}

#[test]
fn test_only_one_trailing_slash_is_stripped() {
    let s = sources(Some("https://shelf.example.com//"), None, None, None);
    assert_eq!(resolve_base_url(&s), "https://shelf.example.com/");
}

#[test]
fn test_callback_url_appends_path() {
    let s = sources(Some("https://shelf.example.com/"), None, None, None);
    assert_eq!(auth_callback_url(&s), "https://shelf.example.com/auth/callback");
    assert_eq!(
        auth_callback_url(&UrlSources::default()),
        "http://localhost:3000/auth/callback"
    );
}

#[test]
fn test_with_forwarded_ignores_blank_headers() {
    let s = UrlSources::default().with_forwarded(Some("  "), Some(""));
    assert_eq!(s.forwarded_host, None);
    assert_eq!(s.forwarded_proto, None);

    let s = UrlSources::default().with_forwarded(Some("app.example.com"), Some("http"));
    assert_eq!(resolve_base_url(&s), "http://app.example.com");
}

#[rstest]
#[case(Some("/dashboard"), "/dashboard")]
#[case(Some("/profile?tab=1"), "/profile?tab=1")]
#[case(Some("//evil.example"), "/")]
#[case(Some("https://evil.example"), "/")]
#[case(Some(""), "/")]
#[case(None, "/")]
fn test_safe_next_path(#[case] next: Option<&str>, #[case] expected: &str) {
    assert_eq!(safe_next_path(next), expected);
}

#[test]
fn test_auth_redirect_success_and_failure() {
    let s = sources(Some("https://shelf.example.com"), None, None, None);
    assert_eq!(
        auth_redirect(&s, Some("/dashboard"), true),
        "https://shelf.example.com/dashboard"
    );
    assert_eq!(auth_redirect(&s, None, true), "https://shelf.example.com/");
    assert_eq!(
        auth_redirect(&s, Some("/dashboard"), false),
        "https://shelf.example.com/login?error=auth_failed"
    );
}
