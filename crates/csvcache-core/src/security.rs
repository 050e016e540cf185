//! SSRF guard for CSV source URLs.
//!
//! A URL is accepted only if it is `http`/`https`, has a host, and every
//! address the host stands for is publicly routable. IP literals are checked
//! directly; domain names are resolved first. Any doubt rejects.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::{debug, warn};
use url::{Host, Url};

use crate::error::CsvCacheError;

/// Validate a target URL, resolving its host if it is a domain name.
pub async fn validate_url(raw: &str) -> Result<Url, CsvCacheError> {
    let (url, host) = check_shape(raw)?;

    match host {
        Host::Ipv4(ip) => ensure_public(IpAddr::V4(ip))?,
        Host::Ipv6(ip) => ensure_public(IpAddr::V6(ip))?,
        Host::Domain(domain) => {
            let port = url.port_or_known_default().unwrap_or(80);
            let addrs: Vec<_> = match tokio::net::lookup_host((domain.as_str(), port)).await {
                Ok(addrs) => addrs.collect(),
                Err(e) => {
                    warn!(host = %domain, error = %e, "Host resolution failed");
                    return Err(CsvCacheError::UnsafeUrl);
                }
            };
            if addrs.is_empty() {
                warn!(host = %domain, "Host resolved to no addresses");
                return Err(CsvCacheError::UnsafeUrl);
            }
            for addr in addrs {
                ensure_public(addr.ip())?;
            }
        }
    }

    Ok(url)
}

/// Scheme and host checks that need no network access.
pub fn check_shape(raw: &str) -> Result<(Url, Host<String>), CsvCacheError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CsvCacheError::UnsafeUrl);
    }

    let Ok(url) = Url::parse(trimmed) else {
        debug!("URL did not parse");
        return Err(CsvCacheError::UnsafeUrl);
    };

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        debug!(scheme = %scheme, "Rejected URL scheme");
        return Err(CsvCacheError::UnsafeUrl);
    }

    let host = url
        .host()
        .map(|h| h.to_owned())
        .ok_or(CsvCacheError::UnsafeUrl)?;
    if let Host::Domain(ref d) = host {
        if d.is_empty() {
            return Err(CsvCacheError::UnsafeUrl);
        }
    }

    Ok((url, host))
}

fn ensure_public(ip: IpAddr) -> Result<(), CsvCacheError> {
    if is_public_ip(ip) {
        Ok(())
    } else {
        warn!(ip = %ip, "Rejected non-public address");
        Err(CsvCacheError::UnsafeUrl)
    }
}

/// True if `ip` is globally routable.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        || a == 0
        // shared address space, 100.64.0.0/10
        || (a == 100 && (b & 0xc0) == 64)
        // IETF protocol assignments, 192.0.0.0/24
        || (a == 192 && b == 0 && c == 0)
        // benchmarking, 198.18.0.0/15
        || (a == 198 && (b & 0xfe) == 18)
        // reserved, 240.0.0.0/4
        || a >= 240)
}

/// IPv4 address carried inside an IPv6 one: mapped `::ffff:0:0/96`,
/// compatible `::/96`, NAT64 `64:ff9b::/96` or 6to4 `2002::/16`.
fn embedded_v4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    let v4 = |hi: u16, lo: u16| {
        let [a, b] = hi.to_be_bytes();
        let [c, d] = lo.to_be_bytes();
        Ipv4Addr::new(a, b, c, d)
    };
    match ip.segments() {
        [0, 0, 0, 0, 0, 0xffff, hi, lo]
        | [0, 0, 0, 0, 0, 0, hi, lo]
        | [0x64, 0xff9b, 0, 0, 0, 0, hi, lo]
        | [0x2002, hi, lo, ..] => Some(v4(hi, lo)),
        _ => None,
    }
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() || ip.is_multicast() {
        return false;
    }
    if let Some(v4) = embedded_v4(ip) {
        return is_public_v4(v4);
    }
    let [first, second, ..] = ip.segments();
    !(
        // unique local, fc00::/7
        (first & 0xfe00) == 0xfc00
        // link local, fe80::/10
        || (first & 0xffc0) == 0xfe80
        // deprecated site local, fec0::/10
        || (first & 0xffc0) == 0xfec0
        // documentation, 2001:db8::/32
        || (first == 0x2001 && second == 0x0db8)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_shape_scheme_and_host() {
        assert!(check_shape("").is_err());
        assert!(check_shape("   ").is_err());
        assert!(check_shape("not a url").is_err());
        assert!(check_shape("ftp://host/x.csv").is_err());
        assert!(check_shape("file:///etc/passwd").is_err());
        assert!(check_shape("javascript:alert(1)").is_err());
        assert!(check_shape("https://example.com/x.csv").is_ok());
        assert!(check_shape(" http://93.184.216.34/x.csv ").is_ok());
    }

    #[test]
    fn test_private_v4_ranges() {
        for ip in [
            "127.0.0.1",
            "10.1.2.3",
            "172.16.0.1",
            "192.168.1.1",
            "169.254.169.254",
            "0.0.0.0",
            "255.255.255.255",
            "100.64.0.1",
            "198.18.0.1",
            "224.0.0.1",
            "240.0.0.1",
            "192.0.0.8",
        ] {
            assert!(!is_public_ip(ip.parse().unwrap()), "{} should be rejected", ip);
        }
        assert!(is_public_ip("93.184.216.34".parse().unwrap()));
        assert!(is_public_ip("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn test_private_v6_ranges() {
        for ip in [
            "::1",
            "::",
            "fe80::1",
            "fd00::1",
            "fec0::1",
            "ff02::1",
            "::ffff:127.0.0.1",
            "::127.0.0.1",
            "::10.0.0.1",
            "64:ff9b::a9fe:a9fe",
            "2002:7f00:1::",
            "2002:c0a8:101::1",
            "2001:db8::1",
        ] {
            assert!(!is_public_ip(ip.parse().unwrap()), "{} should be rejected", ip);
        }
        assert!(is_public_ip("2606:2800:220:1:248:1893:25c8:1946".parse().unwrap()));
        // embedded public addresses stay public
        assert!(is_public_ip("::ffff:93.184.216.34".parse().unwrap()));
        assert!(is_public_ip("2002:5db8:d822::1".parse().unwrap()));
        assert!(is_public_ip("64:ff9b::5db8:d822".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_validate_url_literals() {
        assert_eq!(
            validate_url("http://127.0.0.1/x.csv").await,
            Err(CsvCacheError::UnsafeUrl)
        );
        assert_eq!(
            validate_url("http://[::1]:8080/x.csv").await,
            Err(CsvCacheError::UnsafeUrl)
        );
        assert_eq!(
            validate_url("ftp://host/x.csv").await,
            Err(CsvCacheError::UnsafeUrl)
        );
        for raw in [
            "http://[::127.0.0.1]/x.csv",
            "http://[64:ff9b::a9fe:a9fe]/x.csv",
            "http://[2002:7f00:1::]/x.csv",
            "http://[fec0::1]/x.csv",
            "http://192.0.0.8/x.csv",
        ] {
            assert_eq!(validate_url(raw).await, Err(CsvCacheError::UnsafeUrl), "{}", raw);
        }
        let url = validate_url("https://93.184.216.34/data.csv").await.unwrap();
        assert_eq!(url.path(), "/data.csv");
    }

    #[tokio::test]
    async fn test_validate_url_localhost_name() {
        assert!(validate_url("http://localhost/x.csv").await.is_err());
    }
}
