//! 控制台报告渲染（文本格式）
//!
//! 输出写入调用方提供的 writer，便于测试捕获与重定向；
//! 颜色只包裹评级词本身，重定向到文件时可整体关闭。
use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;

use crate::classify::Severity;
use crate::options::AuditStats;
use crate::types::FileReport;

/// 分隔线宽度
const RULE_WIDTH: usize = 80;

/// 关闭 ANSI 着色；输出进文件或 JSON 时调用
pub fn force_plain_output() {
    colored::control::set_override(false);
}

pub(crate) fn render_header(out: &mut dyn Write, root: &Path) -> io::Result<()> {
    writeln!(out, "🔍 Scanning {} for ToxicSkills signatures...", root.display())?;
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

pub(crate) fn render_file_report(out: &mut dyn Write, report: &FileReport) -> io::Result<()> {
    match report.severity {
        Severity::Critical => {
            writeln!(out, "🚨 [{}] {}", "CRITICAL".red().bold(), report.path.display())?;
            writeln!(out, "   Risk Score: {}", report.score)?;
            writeln!(out, "   SHA256: {}", report.sha256)?;
            for finding in &report.findings {
                writeln!(out, "   ⚠️  {finding}")?;
            }
            writeln!(out)
        }
        Severity::Suspicious => {
            writeln!(out, "⚠️  [{}] {}", "SUSPICIOUS".yellow(), report.path.display())?;
            writeln!(out, "   Risk Score: {}", report.score)?;
            writeln!(out, "   SHA256: {}", report.sha256)?;
            for finding in &report.findings {
                writeln!(out, "   • {finding}")?;
            }
            writeln!(out)
        }
        Severity::Safe => {
            writeln!(out, "✅ [{}] {} (Score: {})", "SAFE".green(), report.path.display(), report.score)
        }
    }
}

pub(crate) fn render_summary(out: &mut dyn Write, stats: &AuditStats) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out)?;
    writeln!(out, "📊 Scan Summary:")?;
    writeln!(out, "   Total files scanned: {}", stats.files_scanned)?;
    writeln!(out, "   Critical files: {}", stats.critical_files)?;
    writeln!(out, "   Suspicious files: {}", stats.suspicious_files)?;
    writeln!(out, "   Safe files: {}", stats.safe_files())?;
    writeln!(out)?;
    if stats.critical_files > 0 {
        writeln!(out, "🚨 CRITICAL: {} files require immediate review!", stats.critical_files)?;
        writeln!(out, "   DO NOT use these skills until manually audited.")?;
    } else if stats.suspicious_files > 0 {
        writeln!(out, "⚠️  WARNING: {} files are suspicious.", stats.suspicious_files)?;
        writeln!(out, "   Review these files before use.")?;
    } else {
        writeln!(out, "✅ All files appear safe (no high-risk patterns detected).")?;
    }
    writeln!(out)?;
    writeln!(out, "⚠️  Note: This scanner uses heuristics and may have false positives/negatives.")?;
    writeln!(out, "   Always manually review skill files before use.")
}
