//! 恶意 Skill 文档扫描库
//!
//! 设计要点：
//! - 固定规则目录启动时编译一次（regex + Aho-Corasick 预过滤），扫描阶段零编译开销。
//! - 行为规则只看围栏代码块；敏感路径、长令牌、Base64 启发式作用于全文。
//! - `scan_text` 为纯函数（无 I/O、无共享可变状态），可安全并行到逐文件粒度。
//! - 候选文件按完整路径排序，并行输出经单线程重排，逐字节等同串行，保证可复现性。

mod classify;
mod detectors;
mod engine;
mod findings;
mod hash;
mod options;
mod prefilter;
mod report;
mod rules;
mod scan;
mod types;

pub use classify::{classify, Severity, CRITICAL_THRESHOLD, SUSPICIOUS_THRESHOLD};
pub use detectors::{Catalog, CatalogError};
pub use engine::scan_text;
pub use findings::{Finding, ScanResult};
pub use hash::sha256_file;
pub use options::{AuditOptions, AuditStats, OutputFormat};
pub use report::force_plain_output;
pub use rules::{sensitive_paths, suspicious_patterns, RuleSpec};
pub use scan::{audit_and_write, scan_candidate};
pub use types::FileReport;
