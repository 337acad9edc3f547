//! 扫描引擎：代码块抽取 + 加权启发式匹配
//!
//! 算法口径（顺序固定，结果可复现）：
//! 1. 非贪婪抽取三反引号围栏代码块（含语言标记行，相邻围栏不合并）；
//! 2. 行为规则逐块匹配，同规则同块只计一次分，摘录取首个匹配；
//! 3. 敏感路径规则作用于全文（散文里的引用同样算数）；
//! 4. 空白切分后超过 100 字符且非 URL 的令牌，每条计 5 分；
//! 5. ≥50 字符的 Base64 形串按串计 6 分，但聚合为一条命中。
use std::sync::OnceLock;

use regex::Regex;

use crate::detectors::Catalog;
use crate::findings::{Finding, ScanResult};

/// 长令牌判定阈值（字符数，严格大于）
const LONG_TOKEN_MIN_CHARS: usize = 100;
/// 长令牌单条权重
const LONG_TOKEN_WEIGHT: u32 = 5;
/// Base64 形串单串权重
const BASE64_RUN_WEIGHT: u32 = 6;

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(.*?)```").expect("fence regex"))
}

fn base64_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9+/]{50,}={0,2}").expect("base64 regex"))
}

/// 抽取全部围栏代码块内容；落单的围栏不配对，整体忽略
fn fenced_regions(text: &str) -> Vec<&str> {
    fence_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// 扫描单篇文档文本，返回总分与按发现顺序排列的命中。
///
/// 纯函数：只读输入与目录，无 I/O、无共享可变状态；
/// 同一输入两次调用产出逐字段相同的结果，可安全并行到逐文件粒度。
pub fn scan_text(text: &str, catalog: &Catalog) -> ScanResult {
    let mut score: u32 = 0;
    let mut findings: Vec<Finding> = Vec::new();

    // 1) 行为规则：逐代码块执行，同规则同块只计一次
    for region in fenced_regions(text) {
        let mask = catalog.behavior.candidates(region);
        for (idx, rule) in catalog.behavior.rules().iter().enumerate() {
            if !mask[idx] {
                continue;
            }
            if let Some(m) = rule.regex.find(region) {
                score += rule.weight;
                findings.push(Finding::rule_hit(rule, m.as_str()));
            }
        }
    }

    // 2) 敏感路径规则：作用于全文
    let mask = catalog.paths.candidates(text);
    for (idx, rule) in catalog.paths.rules().iter().enumerate() {
        if !mask[idx] {
            continue;
        }
        if let Some(m) = rule.regex.find(text) {
            score += rule.weight;
            findings.push(Finding::rule_hit(rule, m.as_str()));
        }
    }

    // 3) 长令牌：空白切分，URL 除外，逐条计分
    for token in text.split_whitespace() {
        if token.starts_with("http://") || token.starts_with("https://") {
            continue;
        }
        if token.chars().count() > LONG_TOKEN_MIN_CHARS {
            score += LONG_TOKEN_WEIGHT;
            findings.push(Finding::long_token(token, LONG_TOKEN_WEIGHT));
        }
    }

    // 4) Base64 形串：按串计分，聚合为一条命中
    let runs = base64_regex().find_iter(text).count();
    if runs > 0 {
        score += BASE64_RUN_WEIGHT * runs as u32;
        findings.push(Finding::base64_runs(runs, BASE64_RUN_WEIGHT));
    }

    ScanResult { score, findings }
}
