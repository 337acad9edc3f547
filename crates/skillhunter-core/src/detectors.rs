//! 规则目录编译（正则 + 锚点预筛）
use regex::RegexBuilder;
use thiserror::Error;

use crate::prefilter::{build_prefilter_plan, PrefilterPlan};
use crate::rules::{sensitive_paths, suspicious_patterns, RuleSpec};

/// 目录数据非法时的构建错误。
/// 目录是固定数据而非外部输入，出错属编程错误，进程启动即失败。
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("rule `{description}` must carry a positive weight")]
    ZeroWeight { description: String },
    #[error("rule `{description}` has an invalid pattern: {source}")]
    BadPattern {
        description: String,
        #[source]
        source: regex::Error,
    },
    #[error("prefilter construction failed: {0}")]
    Prefilter(#[from] aho_corasick::BuildError),
}

/// 编译后的单条规则
pub(crate) struct CompiledRule {
    pub(crate) regex: regex::Regex,
    pub(crate) weight: u32,
    pub(crate) description: String,
}

/// 编译后的一组规则（顺序与输入一致）及其预筛计划
pub(crate) struct RuleSet {
    rules: Vec<CompiledRule>,
    prefilter: PrefilterPlan,
}

impl RuleSet {
    fn compile(specs: &[RuleSpec]) -> Result<Self, CatalogError> {
        let mut rules = Vec::with_capacity(specs.len());
        for spec in specs {
            if spec.weight == 0 {
                return Err(CatalogError::ZeroWeight { description: spec.description.clone() });
            }
            let regex = RegexBuilder::new(&spec.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| CatalogError::BadPattern {
                    description: spec.description.clone(),
                    source,
                })?;
            rules.push(CompiledRule {
                regex,
                weight: spec.weight,
                description: spec.description.clone(),
            });
        }
        let prefilter = build_prefilter_plan(specs)?;
        Ok(Self { rules, prefilter })
    }

    pub(crate) fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// 一段文本的候选规则掩码（与 rules() 等长）
    pub(crate) fn candidates(&self, text: &str) -> Vec<bool> {
        self.prefilter.candidate_mask(text)
    }
}

/// 完整规则目录：行为规则（代码块）+ 敏感路径规则（全文）
pub struct Catalog {
    pub(crate) behavior: RuleSet,
    pub(crate) paths: RuleSet,
}

impl Catalog {
    /// 内置目录（进程启动时构建一次，随后只读共享）
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_specs(suspicious_patterns(), sensitive_paths())
    }

    /// 从自定义规则列表构建；测试可用来替换目录
    pub fn from_specs(behavior: Vec<RuleSpec>, paths: Vec<RuleSpec>) -> Result<Self, CatalogError> {
        Ok(Self { behavior: RuleSet::compile(&behavior)?, paths: RuleSet::compile(&paths)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_compiles() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.behavior.rules().len(), 16);
        assert_eq!(catalog.paths.rules().len(), 7);
    }

    #[test]
    fn compiled_rules_ignore_case() {
        let catalog = Catalog::builtin().unwrap();
        let pipe_to_bash = &catalog.behavior.rules()[1];
        assert!(pipe_to_bash.regex.is_match("| BASH"));
        assert!(pipe_to_bash.regex.is_match("|bash"));
    }

    #[test]
    fn zero_weight_rules_are_rejected() {
        let err = Catalog::from_specs(vec![RuleSpec::new("x", 0, "bad rule")], Vec::new())
            .err()
            .unwrap();
        assert!(matches!(err, CatalogError::ZeroWeight { .. }));
        assert!(err.to_string().contains("bad rule"));
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let err = Catalog::from_specs(vec![RuleSpec::new("([unclosed", 5, "broken")], Vec::new())
            .err()
            .unwrap();
        assert!(matches!(err, CatalogError::BadPattern { .. }));
    }
}
