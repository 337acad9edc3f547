//! 公共类型（对外暴露）
use std::path::PathBuf;

use serde::Serialize;

use crate::classify::Severity;
use crate::findings::Finding;

/// 单个候选文件的审计结果（对应 JSON 输出的单个元素）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub score: u32,
    pub severity: Severity,
    pub sha256: String,
    pub findings: Vec<Finding>,
}
