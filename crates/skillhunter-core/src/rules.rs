//! 内置规则目录（纯数据）
//!
//! 两张有序规则表，增删规则不需要改动扫描引擎的控制流：
//! - 行为规则：只作用于文档中的围栏代码块，权重区间 [6, 15]；
//! - 敏感路径规则：作用于全文，统一权重 8。

/// 归一化后的规则规格（pattern 为正则源文本，匹配时不区分大小写）
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pub pattern: String,
    pub weight: u32,
    pub description: String,
}

impl RuleSpec {
    pub fn new(pattern: impl Into<String>, weight: u32, description: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), weight, description: description.into() }
    }
}

/// 行为规则表：(正则, 权重, 描述)
/// 拉取执行与裸 IP 类模式权重最高；裸 IP 在分发的 skill 内容里
/// 比域名 URL 更接近恶意信号，因此单独建规则并给高分。
const SUSPICIOUS_PATTERNS: &[(&str, u32, &str)] = &[
    (r"base64\s+-d", 10, "Base64 decoder (common obfuscation)"),
    (r"\|\s*bash", 10, "Pipe to bash shell"),
    (r"\|\s*sh", 10, "Pipe to sh shell"),
    (r"\|\s*python", 8, "Pipe to python interpreter"),
    (r"curl\s+.*\|\s*", 9, "Fetch and execute pattern"),
    (r"wget\s+.*-\s*O\s*-", 9, "Fetch to stdout pattern"),
    (r"eval\(", 7, "Dangerous eval() call"),
    (r"exec\(", 7, "Dangerous exec() call"),
    (r"http://[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+", 15, "Bare IP address (HIGH RISK)"),
    (r"https://[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+", 15, "Bare IP address over HTTPS (HIGH RISK)"),
    (r"/tmp/\.[a-zA-Z0-9_-]+", 8, "Hidden file in /tmp"),
    (r"chmod\s+\+x", 6, "Making file executable"),
    (r"\.bashrc|\.zshrc|\.profile", 7, "Shell config modification"),
    (r"authorized_keys", 9, "SSH key modification"),
    (r"crontab", 7, "Cron job modification"),
    (r"systemctl|service\s+", 6, "System service manipulation"),
];

/// 敏感路径统一权重
pub(crate) const SENSITIVE_PATH_WEIGHT: u32 = 8;

/// 敏感路径表（字面点号已转义）
const SENSITIVE_PATHS: &[&str] = &[
    r"~/\.ssh/",
    r"~/\.aws/",
    r"~/\.config/",
    r"~/\.gitconfig",
    r"~/\.git-credentials",
    r"/etc/passwd",
    r"/etc/shadow",
];

/// 行为规则（按表内顺序）
pub fn suspicious_patterns() -> Vec<RuleSpec> {
    SUSPICIOUS_PATTERNS
        .iter()
        .map(|&(pattern, weight, description)| RuleSpec::new(pattern, weight, description))
        .collect()
}

/// 敏感路径规则（按表内顺序，统一权重与描述）
pub fn sensitive_paths() -> Vec<RuleSpec> {
    SENSITIVE_PATHS
        .iter()
        .map(|&pattern| RuleSpec::new(pattern, SENSITIVE_PATH_WEIGHT, "Accesses sensitive path"))
        .collect()
}
