//! 命中项与扫描结果（对外暴露）
use std::fmt;

use serde::Serialize;

use crate::detectors::CompiledRule;

/// 规则/路径命中的摘录上限（字符）；从不回显完整匹配，控制报告体积
const EXCERPT_MAX_CHARS: usize = 100;
/// 长令牌命中的摘录上限（字符）
const TOKEN_EXCERPT_CHARS: usize = 50;

/// 单条命中记录
/// - `occurrences`：普通命中为 1，Base64 聚合命中为串数；
/// - 对总分的贡献 = weight × occurrences。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub weight: u32,
    pub occurrences: usize,
    pub description: String,
    pub excerpt: String,
}

impl Finding {
    /// 规则命中：摘录取首个匹配文本，截断到 100 字符
    pub(crate) fn rule_hit(rule: &CompiledRule, matched: &str) -> Self {
        Self {
            weight: rule.weight,
            occurrences: 1,
            description: rule.description.clone(),
            excerpt: truncate_chars(matched, EXCERPT_MAX_CHARS),
        }
    }

    /// 长令牌命中：摘录取前 50 字符并追加省略号
    pub(crate) fn long_token(token: &str, weight: u32) -> Self {
        let mut excerpt = truncate_chars(token, TOKEN_EXCERPT_CHARS);
        excerpt.push_str("...");
        Self {
            weight,
            occurrences: 1,
            description: "High entropy/long string detected".to_string(),
            excerpt,
        }
    }

    /// Base64 聚合命中：一条记录携带全部串数
    pub(crate) fn base64_runs(count: usize, weight: u32) -> Self {
        Self {
            weight,
            occurrences: count,
            description: format!("Found {count} potential Base64-encoded strings"),
            excerpt: String::new(),
        }
    }

    /// 读取/解码失败：零分记录，摘录为错误文本
    pub(crate) fn read_failure(err: impl fmt::Display) -> Self {
        Self {
            weight: 0,
            occurrences: 1,
            description: "ERROR reading file".to_string(),
            excerpt: err.to_string(),
        }
    }

    /// 该命中对总分的贡献
    pub fn contribution(&self) -> u32 {
        self.weight * self.occurrences as u32
    }
}

impl fmt::Display for Finding {
    /// 渲染为 `[权重] 描述: 摘录`；零权重省略前缀，空摘录省略冒号段
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weight > 0 {
            write!(f, "[{}] ", self.weight)?;
        }
        f.write_str(&self.description)?;
        if !self.excerpt.is_empty() {
            write!(f, ": {}", self.excerpt)?;
        }
        Ok(())
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// 单篇文档的扫描结果：总分 + 按发现顺序排列的命中
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub score: u32,
    pub findings: Vec<Finding>,
}

impl ScanResult {
    /// 读取/解码失败的降级结果：零分 + 单条说明。
    /// 整树审计不因单个坏文件中断。
    pub fn read_failure(err: impl fmt::Display) -> Self {
        Self { score: 0, findings: vec![Finding::read_failure(err)] }
    }
}
