//! 审计选项与统计信息（模块）
use crate::classify::Severity;

/// 报告输出格式
/// - Text：带评级标记的控制台报告，附扫描汇总。
/// - Json：`FileReport` 的 JSON 数组，适合下游程序消费。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// 审计选项
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// 报告输出格式：Text（控制台）或 Json（数组）
    pub format: OutputFormat,
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            max_file_size: None,
            threads: None,
        }
    }
}

/// 审计统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuditStats {
    pub files_scanned: usize,
    pub critical_files: usize,
    pub suspicious_files: usize,
}

impl AuditStats {
    /// 既非危急也非可疑的文件数
    pub fn safe_files(&self) -> usize {
        self.files_scanned - self.critical_files - self.suspicious_files
    }

    pub(crate) fn record(&mut self, severity: Severity) {
        self.files_scanned += 1;
        match severity {
            Severity::Critical => self.critical_files += 1,
            Severity::Suspicious => self.suspicious_files += 1,
            Severity::Safe => {}
        }
    }
}
