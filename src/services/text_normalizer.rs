//! 文本清洗服务 - 业务能力层
//!
//! 修复错误解码的字符、去掉 HTML 标签、展开实体、压缩空白
//!
//! 每一轮清洗只会缩短文本（或替换掉不会再出现的字符），
//! 所以反复清洗直到结果不再变化即可保证 `normalize(normalize(x)) == normalize(x)`

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// 常见乱码（UTF-8 被当成 Windows-1252 解码）替换表
///
/// 按顺序替换，较长的序列必须排在前面
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¦", "..."),
    ("â€¢", "-"),
    ("â€", "\""),
    ("Â", ""),
    ("`", "'"),
    ("\\textsuperscript{th}", "th"),
    ("\\textsuperscript{st}", "st"),
    ("\\textsuperscript{nd}", "nd"),
    ("\\textsuperscript{rd}", "rd"),
    ("\\u20b9", "Rs."),
    ("\u{20b9}", "Rs."),
];

/// HTML 实体表
static ENTITIES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "&nbsp;" => " ",
    "&amp;" => "&",
    "&lt;" => "<",
    "&gt;" => ">",
    "&quot;" => "\"",
    "&#39;" => "'",
    "&apos;" => "'",
    "&lsquo;" => "'",
    "&rsquo;" => "'",
    "&ldquo;" => "\"",
    "&rdquo;" => "\"",
    "&ndash;" => "-",
    "&mdash;" => "-",
    "&hellip;" => "...",
    "&times;" => "x",
    "&divide;" => "/",
};

/// 标签属性：只接受 `name=value` 形式，避免把 `a <b and c> d` 这类比较式当成标签
const TAG_ATTRS: &str = r#"(?:\s+[A-Za-z_:][-A-Za-z0-9_:.]*\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'<>]+))*\s*/?"#;

/// 只匹配已知标签名的开闭标签
fn tag_regex(names: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)<(?:/(?:{names})\s*|(?:{names}){attrs})>",
        names = names,
        attrs = TAG_ATTRS
    ))
    .expect("tag regex is invalid")
}

/// 块级标签，替换为空格以免相邻单词粘连
static BLOCK_TAG: LazyLock<Regex> =
    LazyLock::new(|| tag_regex(r"br|p|div|li|ul|ol|tr|td|th|table|tbody|thead|h[1-6]"));

/// 行内标签，直接删除
static INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    tag_regex(r"sub|sup|b|i|u|em|strong|span|font|img|a|small|code|s|strike|del|ins|mark|center")
});

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#?[A-Za-z0-9]+;").expect("entity regex is invalid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is invalid"));

/// 清洗文本
pub fn normalize(text: &str) -> String {
    let mut current = clean_pass(text);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// 清洗可能缺失的文本，缺失视为空字符串
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

/// 清洗并转小写，用于生成分组键
pub fn normalize_key(text: &str) -> String {
    normalize(text).to_lowercase()
}

fn clean_pass(text: &str) -> String {
    let mut out = text.to_string();
    for (broken, fixed) in MOJIBAKE {
        if out.contains(broken) {
            out = out.replace(broken, fixed);
        }
    }

    let out = BLOCK_TAG.replace_all(&out, " ");
    let out = INLINE_TAG.replace_all(&out, "");
    let out = ENTITY.replace_all(&out, |caps: &Captures| {
        let entity = &caps[0];
        ENTITIES.get(entity).copied().unwrap_or(entity).to_string()
    });
    let out = WHITESPACE.replace_all(&out, " ");

    out.trim().to_string()
}
