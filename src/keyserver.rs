use std::future::Future;

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::key::PgpKey;
use crate::parse::VindexParser;
use crate::types::KeyserverOptions;

/// Transport used to fetch keyserver responses.
///
/// Implementations own session handling, user agent and retries; the client
/// only needs the response body. Failed requests are reported as
/// [`Error::Transport`].
pub trait HttpGet {
    fn get_content(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Queries an HKP keyserver's machine readable index.
///
/// # Example
///
/// ```no_run
/// # async fn example(http: impl pgp_expiry::HttpGet) -> pgp_expiry::Result<()> {
/// use pgp_expiry::{Fingerprint, KeyserverClient};
///
/// let client = KeyserverClient::new("https://keyserver.example.com", http);
/// let fingerprint = Fingerprint::parse("A999B7498D1A8DC473E53C92309F635DAD1B5517")?;
/// let key = client.get_key_for_fingerprint(&fingerprint).await?;
/// println!("{key}");
/// # Ok(())
/// # }
/// ```
pub struct KeyserverClient<G> {
    keyserver: String,
    http: G,
    options: KeyserverOptions,
}

impl<G: HttpGet> KeyserverClient<G> {
    #[must_use]
    pub fn new(keyserver: impl Into<String>, http: G) -> Self {
        Self::with_options(keyserver, http, KeyserverOptions::default())
    }

    #[must_use]
    pub fn with_options(keyserver: impl Into<String>, http: G, options: KeyserverOptions) -> Self {
        Self {
            keyserver: keyserver.into(),
            http,
            options,
        }
    }

    pub fn vindex_url(&self, query: &str) -> String {
        format!(
            "{}/pks/lookup?search={}&op=vindex&options=mr",
            self.keyserver, query
        )
    }

    pub fn get_url(&self, fingerprint: &Fingerprint) -> String {
        format!(
            "{}/pks/lookup?op=get&search={}&options=mr",
            self.keyserver,
            fingerprint.hex_format()
        )
    }

    /// Runs a vindex search and parses every key in the response.
    pub async fn do_vindex_search(&self, query: &str) -> Result<Vec<PgpKey>> {
        let url = self.vindex_url(query);
        let response = self.fetch(&url).await?;
        Ok(VindexParser::from_bytes(&response)?.collect())
    }

    /// Keys matching a short or long key id, skipping revoked ones.
    pub async fn get_keys_for_short_id(&self, short_id: &str) -> Result<Vec<PgpKey>> {
        let keys = self.do_vindex_search(short_id).await?;
        Ok(keys.into_iter().filter(PgpKey::is_valid).collect())
    }

    /// Fetches exactly one key and checks the keyserver returned the key
    /// that was asked for.
    pub async fn get_key_for_fingerprint(&self, fingerprint: &Fingerprint) -> Result<PgpKey> {
        let query = fingerprint.hex_format();
        let mut keys = self.do_vindex_search(&query).await?;

        if keys.len() != 1 {
            return Err(Error::UnexpectedKeyCount {
                query,
                count: keys.len(),
            });
        }

        let key = keys.remove(0);
        match key.fingerprint() {
            Some(received) if received == fingerprint => Ok(key),
            received => Err(Error::SuspiciousKey {
                requested: fingerprint.to_string(),
                received: received.map(ToString::to_string).unwrap_or_default(),
            }),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let request = self.http.get_content(url);

        match self.options.timeout_secs {
            Some(secs) => tokio::time::timeout(std::time::Duration::from_secs(secs), request)
                .await
                .map_err(|_| Error::Timeout(secs))?,
            None => request.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::*;

    const SAMPLE_VINDEX: &str = r#"info:1:1
pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274:1513954217:
uid:Paul Michael Furley <paul@paulfurley.com>:1482418217::
uid:Paul Michael Furley <furbitso@gmail.com>:1482418217::
"#;

    struct MockHttp {
        response: Vec<u8>,
        requested: Mutex<Vec<String>>,
    }

    impl MockHttp {
        fn new(response: &str) -> Self {
            Self {
                response: response.as_bytes().to_vec(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpGet for MockHttp {
        async fn get_content(&self, url: &str) -> Result<Vec<u8>> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self.response.clone())
        }
    }

    struct SlowHttp;

    impl HttpGet for SlowHttp {
        async fn get_content(&self, _url: &str) -> Result<Vec<u8>> {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    struct UnreachableHttp;

    impl HttpGet for UnreachableHttp {
        async fn get_content(&self, url: &str) -> Result<Vec<u8>> {
            Err(Error::Transport(format!("connection refused: {url}")))
        }
    }

    fn fingerprint(s: &str) -> Fingerprint {
        Fingerprint::parse(s).unwrap()
    }

    #[test]
    fn test_make_vindex_url() {
        let client = KeyserverClient::new("http://a.com", MockHttp::new(""));
        assert_eq!(
            client.vindex_url("0xDEADBEEF"),
            "http://a.com/pks/lookup?search=0xDEADBEEF&op=vindex&options=mr"
        );
    }

    #[test]
    fn test_make_get_url() {
        let client = KeyserverClient::new("http://a.com", MockHttp::new(""));
        assert_eq!(
            client.get_url(&fingerprint("A999B7498D1A8DC473E53C92309F635DAD1B5517")),
            "http://a.com/pks/lookup?op=get&search=0xA999B7498D1A8DC473E53C92309F635DAD1B5517&options=mr"
        );
    }

    #[tokio::test]
    async fn test_get_key_for_fingerprint() {
        let client = KeyserverClient::new("http://a.com", MockHttp::new(SAMPLE_VINDEX));
        let requested = fingerprint("0xA999B7498D1A8DC473E53C92309F635DAD1B5517");

        let key = client.get_key_for_fingerprint(&requested).await.unwrap();

        assert_eq!(key.fingerprint(), Some(&requested));
        assert_eq!(key.expiry_date(), NaiveDate::from_ymd_opt(2017, 12, 22));
        assert_eq!(
            client.http.requested.lock().unwrap().as_slice(),
            ["http://a.com/pks/lookup?search=0xA999B7498D1A8DC473E53C92309F635DAD1B5517&op=vindex&options=mr"]
        );
    }

    #[tokio::test]
    async fn test_get_key_for_fingerprint_rejects_mismatch() {
        let client = KeyserverClient::new("http://a.com", MockHttp::new(SAMPLE_VINDEX));
        let requested = fingerprint("0x0000000000000000000000000000000000000000");

        let result = client.get_key_for_fingerprint(&requested).await;
        assert!(matches!(result, Err(Error::SuspiciousKey { .. })));
    }

    #[tokio::test]
    async fn test_get_key_for_fingerprint_requires_one_key() {
        let client = KeyserverClient::new("http://a.com", MockHttp::new("info:1:0\n"));
        let requested = fingerprint("A999B7498D1A8DC473E53C92309F635DAD1B5517");

        let result = client.get_key_for_fingerprint(&requested).await;
        assert!(matches!(
            result,
            Err(Error::UnexpectedKeyCount { count: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_get_keys_for_short_id_skips_revoked() {
        let response = format!(
            "{SAMPLE_VINDEX}pub:5DD5B8F28CBEFA024F9F472B638C78A5E281ACDB:1:2048:1392480548::r\n"
        );
        let client = KeyserverClient::new("http://a.com", MockHttp::new(&response));

        let keys = client.get_keys_for_short_id("0x309F635D").await.unwrap();
        assert_eq!(keys.len(), 1);
        assert!(!keys[0].is_revoked());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let client = KeyserverClient::new("http://a.com", UnreachableHttp);

        let result = client.do_vindex_search("0xDEADBEEF").await;
        assert!(matches!(
            result,
            Err(Error::Transport(message)) if message.contains("connection refused")
        ));

        let result = client
            .get_key_for_fingerprint(&fingerprint("A999B7498D1A8DC473E53C92309F635DAD1B5517"))
            .await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_non_utf8_response_is_error() {
        let http = MockHttp {
            response: vec![0xff, 0xfe, 0xfd],
            requested: Mutex::new(Vec::new()),
        };
        let client = KeyserverClient::new("http://a.com", http);

        let result = client.do_vindex_search("0xDEADBEEF").await;
        assert!(matches!(result, Err(Error::NotText(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let options = KeyserverOptions {
            timeout_secs: Some(5),
        };
        let client = KeyserverClient::with_options("http://a.com", SlowHttp, options);

        let result = client.do_vindex_search("0xDEADBEEF").await;
        assert!(matches!(result, Err(Error::Timeout(5))));
    }
}
