//! 风险分级
use std::fmt;

use serde::Serialize;

/// 可疑阈值：总分达到即判为 SUSPICIOUS
pub const SUSPICIOUS_THRESHOLD: u32 = 10;
/// 危急阈值：总分达到即判为 CRITICAL
pub const CRITICAL_THRESHOLD: u32 = 20;

/// 严重级别（由总分派生，不单独存储）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Safe,
    Suspicious,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Safe => write!(f, "SAFE"),
            Severity::Suspicious => write!(f, "SUSPICIOUS"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// 总分 → 严重级别。纯函数，阈值为固定常量。
pub fn classify(score: u32) -> Severity {
    if score >= CRITICAL_THRESHOLD {
        Severity::Critical
    } else if score >= SUSPICIOUS_THRESHOLD {
        Severity::Suspicious
    } else {
        Severity::Safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_exact() {
        assert_eq!(classify(0), Severity::Safe);
        assert_eq!(classify(9), Severity::Safe);
        assert_eq!(classify(10), Severity::Suspicious);
        assert_eq!(classify(19), Severity::Suspicious);
        assert_eq!(classify(20), Severity::Critical);
        assert_eq!(classify(u32::MAX), Severity::Critical);
    }

    #[test]
    fn classification_is_idempotent() {
        for score in [0, 9, 10, 19, 20, 34, 100] {
            assert_eq!(classify(score), classify(score));
        }
    }

    #[test]
    fn tiers_render_uppercase() {
        assert_eq!(Severity::Safe.to_string(), "SAFE");
        assert_eq!(Severity::Suspicious.to_string(), "SUSPICIOUS");
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn tiers_serialize_as_their_rendered_names() {
        // JSON 与控制台对级别的拼写必须一致
        assert_eq!(serde_json::to_string(&Severity::Safe).unwrap(), "\"SAFE\"");
        assert_eq!(serde_json::to_string(&Severity::Suspicious).unwrap(), "\"SUSPICIOUS\"");
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"CRITICAL\"");
    }

    #[test]
    fn tiers_order_by_risk() {
        assert!(Severity::Safe < Severity::Suspicious);
        assert!(Severity::Suspicious < Severity::Critical);
    }
}
