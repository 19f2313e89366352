use url::Url;

const INVALID_SCHEME: &str = "scheme must be https:// or http:// .";

pub fn check_scheme(url: &str) -> Result<String, String> {
    let parsed = Url::parse(url).map_err(|e| e.to_string())?;

    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return Err(INVALID_SCHEME.to_string());
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_url() {
        init_dummy_tracing_subscriber();

        check_scheme("https://swift.example.org").unwrap();
        check_scheme("https://swift.example.org:8080/").unwrap();
        check_scheme("http://127.0.0.1:9000").unwrap();
    }

    #[test]
    fn invalid_url() {
        init_dummy_tracing_subscriber();

        assert_eq!(
            check_scheme("ftp://swift.example.org").unwrap_err(),
            INVALID_SCHEME
        );
        assert!(check_scheme("swift.example.org").is_err());
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
