//! Static scan of script text for operations unsafe to run in a host session

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

struct UnsafePattern {
    label: &'static str,
    regex: Regex,
}

static UNSAFE_PATTERNS: LazyLock<Vec<UnsafePattern>> = LazyLock::new(|| {
    [
        ("subprocess", r"\bsubprocess\b"),
        ("os.system", r"\bos\.system\s*\("),
        ("os.popen", r"\bos\.popen\s*\("),
        ("os.exec", r"\bos\.exec\w*\s*\("),
        ("os.spawn", r"\bos\.spawn\w*\s*\("),
        (
            "file write",
            r#"\bopen\s*\([^,)]+,\s*(?:mode\s*=\s*)?['"][^'"]*[wax]"#,
        ),
        ("file delete", r"\bos\.(?:remove|unlink|rmdir)\s*\("),
        ("shutil.rmtree", r"\bshutil\.rmtree\s*\("),
        ("shutil.move", r"\bshutil\.move\s*\("),
        ("eval", r"(?:^|[^\w.])eval\s*\("),
        ("exec", r"(?:^|[^\w.])exec\s*\("),
        ("__import__", r"__import__"),
        ("socket", r"\bsocket\b"),
        ("urllib", r"\burllib\b"),
        ("requests", r"\bimport\s+requests\b|\brequests\.\w+\s*\("),
    ]
    .into_iter()
    .map(|(label, pattern)| UnsafePattern {
        label,
        regex: Regex::new(pattern).unwrap(),
    })
    .collect()
});

/// One unsafe operation found in a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFlag {
    pub pattern: String,
    /// 1-based line number
    pub line: usize,
}

impl std::fmt::Display for SafetyFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (line {})", self.pattern, self.line)
    }
}

/// Flag unsafe operations in script text. Empty when clean.
///
/// Comment lines are ignored.
pub fn validate_safety(text: &str) -> Vec<SafetyFlag> {
    let mut flags = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        for pattern in UNSAFE_PATTERNS.iter() {
            if pattern.regex.is_match(line) {
                flags.push(SafetyFlag {
                    pattern: pattern.label.to_string(),
                    line: index + 1,
                });
            }
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("import subprocess", "subprocess")]
    #[case("os.system('rm -rf /')", "os.system")]
    #[case("os.execv('/bin/sh', [])", "os.exec")]
    #[case("with open(path, 'w') as f:", "file write")]
    #[case("open(path, mode='a')", "file write")]
    #[case("os.remove(path)", "file delete")]
    #[case("shutil.rmtree(root)", "shutil.rmtree")]
    #[case("eval(code)", "eval")]
    #[case("exec(code)", "exec")]
    #[case("m = __import__('os')", "__import__")]
    #[case("import socket", "socket")]
    #[case("from urllib import request", "urllib")]
    #[case("requests.get(url)", "requests")]
    fn test_flags_unsafe_line(#[case] line: &str, #[case] expected: &str) {
        let flags = validate_safety(line);
        assert!(
            flags.iter().any(|f| f.pattern == expected),
            "{line:?} -> {flags:?}"
        );
    }

    #[test]
    fn test_clean_rig_ui_script() {
        let text = "import bpy\n\
                    # os.system would be bad here\n\
                    class RigUI(bpy.types.Panel):\n\
                    \x20   def draw(self, context):\n\
                    \x20       data = open(path, 'r').read()\n\
                    \x20       self.layout.label(text='evaluate()')\n";
        assert_eq!(validate_safety(text), Vec::new());
    }

    #[test]
    fn test_reports_line_numbers() {
        let flags = validate_safety("x = 1\nimport socket\n");
        assert_eq!(
            flags,
            vec![SafetyFlag {
                pattern: "socket".into(),
                line: 2
            }]
        );
    }
}
