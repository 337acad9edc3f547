//! 锚点预筛（Aho-Corasick）
//!
//! 从规则正则中抽取"锚点"字面量，构建大小写不敏感的 AC 自动机；
//! 扫描一段文本前先用锚点标记候选规则，其余规则跳过精准正则。
//! 预筛只省去必然落空的正则执行，不改变扫描结果：
//! - 锚点抽取保守到"所有匹配必然包含"成立才保留，抽不出就放弃；
//! - 无锚点的规则进入 always 列表，每次都执行；
//! - AC 采用重叠匹配，锚点藏在另一命中内部也能被标记；
//! - s/k 的 Unicode 简单折叠等价类含非 ASCII 成员（U+017F、U+212A），
//!   这类位置按变体拼写建锚，ASCII 折叠的自动机不窄于正则的折叠。

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use crate::rules::RuleSpec;

/// 锚点最短长度；更短的字面量选择性太差，不值得建入自动机
const MIN_ANCHOR_LEN: usize = 3;

/// 单个锚点中折叠不稳定字母（s/k）的数量上限；
/// 变体拼写按 2^n 组合，超过上限的字面量整体放弃
const MAX_FOLD_POSITIONS: usize = 4;

/// 预筛计划（构建一次，跨线程共享）
pub(crate) struct PrefilterPlan {
    /// 锚点自动机；全部规则都无锚点时为 None
    ac: Option<AhoCorasick>,
    /// 锚点索引 -> 候选规则索引列表（与 ac 模式索引一一对应）
    anchor_to_rules: Vec<Vec<usize>>,
    /// 无锚点规则索引（恒为候选）
    always: Vec<usize>,
    rule_count: usize,
}

impl PrefilterPlan {
    /// 标记文本中的候选规则，返回与规则表等长的掩码
    pub(crate) fn candidate_mask(&self, text: &str) -> Vec<bool> {
        let mut mask = vec![false; self.rule_count];
        let mut marked = 0usize;
        for &idx in &self.always {
            mask[idx] = true;
            marked += 1;
        }
        let Some(ac) = &self.ac else { return mask };
        for m in ac.find_overlapping_iter(text) {
            for &idx in &self.anchor_to_rules[m.pattern().as_usize()] {
                if !mask[idx] {
                    mask[idx] = true;
                    marked += 1;
                }
            }
            // 全部规则已标记时提前收束
            if marked == self.rule_count {
                break;
            }
        }
        mask
    }
}

/// 从规则列表构建预筛计划
pub(crate) fn build_prefilter_plan(
    specs: &[RuleSpec],
) -> Result<PrefilterPlan, aho_corasick::BuildError> {
    // 1) 逐条抽取锚点；抽不出的进 always
    let mut anchors: Vec<String> = Vec::new();
    let mut anchor_to_rules: Vec<Vec<usize>> = Vec::new();
    let mut always: Vec<usize> = Vec::new();

    for (idx, spec) in specs.iter().enumerate() {
        let extracted = extract_anchors_from_pattern(&spec.pattern);
        if extracted.is_empty() {
            always.push(idx);
            continue;
        }
        for base in extracted {
            for variant in fold_variants(&base) {
                match anchors.iter().position(|existing| existing == &variant) {
                    Some(aid) => anchor_to_rules[aid].push(idx),
                    None => {
                        anchors.push(variant);
                        anchor_to_rules.push(vec![idx]);
                    }
                }
            }
        }
    }

    // 2) 构建 AC 自动机（ASCII 大小写不敏感；非 ASCII 折叠成员已由变体拼写覆盖）
    let ac = if anchors.is_empty() {
        None
    } else {
        Some(
            AhoCorasickBuilder::new()
                .ascii_case_insensitive(true)
                .match_kind(MatchKind::Standard)
                .build(&anchors)?,
        )
    };

    Ok(PrefilterPlan { ac, anchor_to_rules, always, rule_count: specs.len() })
}

/// 从正则源文本中抽取字面量锚点。
///
/// 只保留"所有匹配必然包含"的字面片段，保守规则如下：
/// - `\` 后的字符一律跳过：类转义（\s/\w/\d）的字母不是字面量，
///   并入相邻片段会产生必然包含性不成立的锚点；
/// - 字符类 `[...]` 与量词花括号 `{...}` 的内容整段跳过；
/// - `?`/`*`/`{` 使紧邻的字面量变为可选，回退一个字符再截断片段；
/// - 含未转义分组 `(` 的模式整条放弃（可选分组会让推理失效）；
/// - 顶层 `|` 的每个分支都必须抽出锚点，否则整条放弃；
/// - 折叠不稳定字母（s/k）超过 [`MAX_FOLD_POSITIONS`] 个的片段放弃。
fn extract_anchors_from_pattern(pat: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut branch: Vec<String> = Vec::new();
    let mut cur = String::new();
    let allow = |ch: char| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '/' | '~');
    let mut in_class = false;
    let mut in_quant = false;
    let mut chars = pat.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            flush_literal(&mut cur, &mut branch);
            let _ = chars.next();
            continue;
        }
        if in_class {
            if ch == ']' {
                in_class = false;
            }
            continue;
        }
        if in_quant {
            if ch == '}' {
                in_quant = false;
            }
            continue;
        }
        match ch {
            '[' => {
                in_class = true;
                flush_literal(&mut cur, &mut branch);
            }
            '(' | ')' => return Vec::new(),
            '|' => {
                flush_literal(&mut cur, &mut branch);
                if branch.is_empty() {
                    return Vec::new();
                }
                out.append(&mut branch);
            }
            '?' | '*' => {
                cur.pop();
                flush_literal(&mut cur, &mut branch);
            }
            '{' => {
                cur.pop();
                flush_literal(&mut cur, &mut branch);
                in_quant = true;
            }
            ch if allow(ch) => cur.push(ch),
            _ => flush_literal(&mut cur, &mut branch),
        }
    }
    flush_literal(&mut cur, &mut branch);
    if branch.is_empty() {
        return Vec::new();
    }
    out.append(&mut branch);

    // 跨分支去重，保持首见顺序
    let mut dedup: Vec<String> = Vec::new();
    for a in out {
        if !dedup.contains(&a) {
            dedup.push(a);
        }
    }
    dedup
}

fn flush_literal(cur: &mut String, branch: &mut Vec<String>) {
    let unstable = cur.chars().filter(|ch| matches!(ch.to_ascii_lowercase(), 's' | 'k')).count();
    if cur.len() >= MIN_ANCHOR_LEN && unstable <= MAX_FOLD_POSITIONS && !branch.contains(cur) {
        branch.push(cur.clone());
    }
    cur.clear();
}

/// 为锚点生成折叠变体拼写。
///
/// 规则正则的 `(?i)` 按 Unicode 简单折叠匹配：`s` 也匹配 U+017F（长 s），
/// `k` 也匹配 U+212A（开尔文符号），而自动机只折叠 ASCII。
/// ASCII 字母里仅这两个的折叠等价类越出 ASCII，为每个 s/k 位置
/// 同时建入两种拼写，锚点覆盖面与正则折叠完全对齐。
fn fold_variants(lit: &str) -> Vec<String> {
    let mut variants = vec![String::with_capacity(lit.len())];
    for ch in lit.chars() {
        let alt = match ch.to_ascii_lowercase() {
            's' => Some('\u{17f}'),
            'k' => Some('\u{212a}'),
            _ => None,
        };
        match alt {
            Some(alt) => {
                let mut next = Vec::with_capacity(variants.len() * 2);
                for v in variants {
                    let mut with_alt = v.clone();
                    with_alt.push(alt);
                    let mut with_ascii = v;
                    with_ascii.push(ch);
                    next.push(with_ascii);
                    next.push(with_alt);
                }
                variants = next;
            }
            None => {
                for v in &mut variants {
                    v.push(ch);
                }
            }
        }
    }
    variants
}
