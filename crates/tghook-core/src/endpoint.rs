/// Builds the public delivery URL Telegram will push updates to.
///
/// The hostname comes from deployment configuration and is used as-is.
pub fn resolve_endpoint(public_host: &str, relative_path: &str) -> String {
    format!("https://{}{}", public_host, relative_path)
}

#[cfg(test)]
mod tests {
    use super::resolve_endpoint;

    #[test]
    fn concatenates_scheme_host_and_path() {
        assert_eq!(
            resolve_endpoint("h.example.com", "/webhook"),
            "https://h.example.com/webhook"
        );
        assert_eq!(
            resolve_endpoint("my-app-git-main.vercel.app", "/api/tg/webhook"),
            "https://my-app-git-main.vercel.app/api/tg/webhook"
        );
    }

    #[test]
    fn resolving_twice_is_stable() {
        let first = resolve_endpoint("h.example.com", "/api/tg/webhook");
        let second = resolve_endpoint("h.example.com", "/api/tg/webhook");
        assert_eq!(first, second);
    }
}
