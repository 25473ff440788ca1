// SPDX-License-Identifier: MPL-2.0

//! Functions for parsing and normalising OPC UA TCP endpoint urls.

use log::error;
use url::Url;

use opcua_types::StatusCode;

/// Scheme used by OPC UA over plain TCP.
pub const OPC_TCP_SCHEME: &str = "opc.tcp";

/// Default port for an OPC UA TCP server when the url does not specify one.
pub const DEFAULT_OPC_UA_SERVER_PORT: u16 = 4840;

fn opc_url_from_str(s: &str) -> Result<Url, url::ParseError> {
    Url::parse(s)
        .map(|mut url| {
            if url.port().is_none() {
                let _ = url.set_port(Some(DEFAULT_OPC_UA_SERVER_PORT));
            }
            url
        })
        .inspect_err(|err| {
            error!("Cannot parse url \"{}\", error = {:?}", s, err);
        })
}

/// Replace the hostname in `url` and return the resulting url string.
pub fn url_with_replaced_hostname(url: &str, hostname: &str) -> Result<String, url::ParseError> {
    let mut url = opc_url_from_str(url)?;
    let _ = url.set_host(Some(hostname));
    Ok(url.into())
}

/// Test if two urls match except for the hostname, e.g. `127.0.0.1` vs `localhost`.
pub fn url_matches_except_host(url1: &str, url2: &str) -> bool {
    if let Ok(mut url1) = opc_url_from_str(url1) {
        if let Ok(mut url2) = opc_url_from_str(url2) {
            if url1.set_host(Some("xxxx")).is_ok() && url2.set_host(Some("xxxx")).is_ok() {
                return url1.as_str().trim_end_matches('/') == url2.as_str().trim_end_matches('/');
            }
        } else {
            error!("Cannot parse url \"{}\"", url2);
        }
    } else {
        error!("Cannot parse url \"{}\"", url1);
    }
    false
}

/// Strip the path and query from an endpoint url, leaving scheme, host and port.
pub fn server_url_from_endpoint_url(endpoint_url: &str) -> Result<String, url::ParseError> {
    opc_url_from_str(endpoint_url).map(|mut url| {
        url.set_query(None);
        if let Some(port) = url.port() {
            if port == DEFAULT_OPC_UA_SERVER_PORT {
                let _ = url.set_port(None);
            }
        }
        url.into()
    })
}

/// `true` if `url` is a valid `opc.tcp://` url.
pub fn is_opc_ua_binary_url(url: &str) -> bool {
    if let Ok(url) = opc_url_from_str(url) {
        url.scheme() == OPC_TCP_SCHEME
    } else {
        false
    }
}

/// Error returned by [`hostname_from_url`].
#[derive(Debug)]
pub enum HostnameFromUrlError {
    /// The url failed to parse.
    Parse(url::ParseError),
    /// The url has no host component.
    MissingHost,
}

impl From<url::ParseError> for HostnameFromUrlError {
    fn from(value: url::ParseError) -> Self {
        Self::Parse(value)
    }
}

/// Extract the hostname from `url`.
pub fn hostname_from_url(url: &str) -> Result<String, HostnameFromUrlError> {
    let url = Url::parse(url)?;
    url.host_str()
        .map(str::to_string)
        .ok_or(HostnameFromUrlError::MissingHost)
}

/// Extract the hostname and port from `url`, defaulting the port to `default_port`.
pub fn hostname_port_from_url(url: &str, default_port: u16) -> Result<(String, u16), StatusCode> {
    let url = Url::parse(url).map_err(|_| StatusCode::BAD_TCP_ENDPOINT_URL_INVALID)?;
    if url.scheme() != OPC_TCP_SCHEME || !url.has_host() {
        Err(StatusCode::BAD_TCP_ENDPOINT_URL_INVALID)
    } else {
        let host = url.host_str().unwrap();
        let port = url.port().unwrap_or(default_port);
        Ok((host.to_string(), port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_scheme() {
        assert!(is_opc_ua_binary_url("opc.tcp://foo/xyz"));
        assert!(is_opc_ua_binary_url(
            "opc.tcp://[FEDC:BA98:7654:3210:FEDC:BA98:7654:3210]:80/xyz"
        ));
        assert!(!is_opc_ua_binary_url("http://foo/xyz"));
    }

    #[test]
    fn url_matches_test() {
        assert!(url_matches_except_host(
            "opc.tcp://localhost/xyz",
            "opc.tcp://127.0.0.1/xyz"
        ));
        assert!(!url_matches_except_host(
            "opc.tcp://localhost/xyz",
            "opc.tcp://127.0.0.1/abc"
        ));
    }

    #[test]
    fn server_url_from_endpoint_url_test() {
        assert_eq!(
            "opc.tcp://localhost",
            server_url_from_endpoint_url("opc.tcp://localhost").unwrap()
        );
        assert_eq!(
            "opc.tcp://localhost",
            server_url_from_endpoint_url("opc.tcp://localhost:4840").unwrap()
        );
        assert_eq!(
            "opc.tcp://localhost:4841",
            server_url_from_endpoint_url("opc.tcp://localhost:4841").unwrap()
        );
        assert_eq!(
            "opc.tcp://localhost/xyz/abc",
            server_url_from_endpoint_url("opc.tcp://localhost/xyz/abc?1").unwrap()
        );
    }

    #[test]
    fn url_with_replaced_hostname_test() {
        assert_eq!(
            url_with_replaced_hostname("opc.tcp://foo:123/x", "foo").unwrap(),
            "opc.tcp://foo:123/x"
        );
        assert_eq!(
            url_with_replaced_hostname("opc.tcp://foo:123/x", "bar").unwrap(),
            "opc.tcp://bar:123/x"
        );
    }

    #[test]
    fn hostname_port_defaults() {
        let (host, port) = hostname_port_from_url("opc.tcp://foo", 4840).unwrap();
        assert_eq!(host, "foo");
        assert_eq!(port, 4840);
        assert!(hostname_port_from_url("http://foo", 4840).is_err());
    }
}
