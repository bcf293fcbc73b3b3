use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = "Burrow/0.1.0";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
}
