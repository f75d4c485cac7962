use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use std::net::SocketAddr;

const EXTRA_IP_HEADERS: [&str; 4] = ["x-real-ip", "x-originating-ip", "client-ip", "true-client-ip"];
const UNKNOWN_IP: &str = "0.0.0.0";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|v| !v.is_empty())
}

/// The client address as seen through proxies.
pub fn primary_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string)
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// Every distinct address in the proxy headers, primary first, loopback excluded.
pub fn all_ips(headers: &HeaderMap, remote: Option<SocketAddr>) -> Vec<String> {
    let mut ips = vec![primary_ip(headers, remote)];
    let mut add = |ip: &str| {
        let ip = ip.trim();
        if !ip.is_empty() && !ips.iter().any(|known| known == ip) {
            ips.push(ip.to_string());
        }
    };
    if let Some(list) = header_str(headers, "x-forwarded-for") {
        list.split(',').for_each(&mut add);
    }
    for name in EXTRA_IP_HEADERS {
        if let Some(ip) = header_str(headers, name) {
            add(ip);
        }
    }
    ips.retain(|ip| ip != "::1" && ip != "127.0.0.1");
    ips
}

/// Salted SHA-256 of an address, first 16 hex characters.
pub fn hash_ip(ip: &str, salt: &str) -> String {
    let digest = Sha256::digest(format!("{}{}", ip, salt).as_bytes());
    digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}
