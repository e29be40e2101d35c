//! Network info screen.

use super::{row_y, TEXT_X};
use crate::rendering::{FontSize, TextLine};
use crate::sensors::NetworkInfo;

/// Lays out the five network fields, `?` for any that failed.
pub fn network_lines(info: &NetworkInfo) -> Vec<TextLine> {
    let rows = [
        format!("IP4: {}", NetworkInfo::field(&info.ipv4)),
        format!("Sub: /{}", NetworkInfo::field(&info.prefix_length)),
        format!("Def: {}", NetworkInfo::field(&info.gateway)),
        format!("Dns: {}", NetworkInfo::field(&info.dns_server)),
        format!("Dom: {}", NetworkInfo::field(&info.dns_domain)),
    ];

    rows.into_iter()
        .enumerate()
        .map(|(row, text)| TextLine::new(TEXT_X, row_y(row), text, FontSize::Normal))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::network::QueryError;

    #[test]
    fn test_network_layout() {
        let info = NetworkInfo {
            ipv4: Ok("192.168.3.20".to_string()),
            prefix_length: Ok(24),
            gateway: Err(QueryError::NotFound("default route")),
            dns_server: Ok("192.168.3.1".to_string()),
            dns_domain: Err(QueryError::NotFound("DNS Domain:")),
        };

        let lines = network_lines(&info);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "IP4: 192.168.3.20",
                "Sub: /24",
                "Def: ?",
                "Dns: 192.168.3.1",
                "Dom: ?",
            ]
        );
        assert!(lines.iter().all(|l| l.x == 6 && l.size == FontSize::Normal));
        assert_eq!(lines[4].y, 50);
    }
}
