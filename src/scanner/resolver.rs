//! 标签解析策略

use once_cell::sync::Lazy;
use regex::Regex;

use super::alias::AliasTable;
use super::symbol::SymbolKind;

/// 映射门控模式：恰好 4 个 ASCII 数字加 1 个 ASCII 字母。
/// 这是对外行为的一部分，改动需要版本说明。
static MAPPABLE_PAYLOAD: Lazy<Regex> = Lazy::new(|| Regex::new("^[0-9]{4}[A-Za-z]$").unwrap());

/// 解析结果；is_aliased 是持久化的唯一判据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLabel {
    pub label: String,
    pub is_aliased: bool,
}

/// 载荷是否符合映射门控模式
pub fn mappable_payload(payload: &str) -> bool {
    MAPPABLE_PAYLOAD.is_match(payload)
}

/// 默认标签为 `{TYPE}: {payload}`；CODE128 且载荷命中映射表时使用别名
pub fn resolve(kind: SymbolKind, payload: &str, aliases: &AliasTable) -> ResolvedLabel {
    if kind == SymbolKind::Code128 && mappable_payload(payload) {
        if let Some(alias) = aliases.lookup(payload) {
            return ResolvedLabel {
                label: alias.to_string(),
                is_aliased: true,
            };
        }
    }
    ResolvedLabel {
        label: format!("{}: {}", kind.name(), payload),
        is_aliased: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        [("3009P".to_string(), "21008고진우".to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_mappable_pattern() {
        assert!(mappable_payload("3009P"));
        assert!(mappable_payload("0000a"));
        assert!(!mappable_payload("300P"));
        assert!(!mappable_payload("30091"));
        assert!(!mappable_payload("3009PP"));
        assert!(!mappable_payload(" 3009P"));
        // 非 ASCII 数字不算
        assert!(!mappable_payload("٣٠٠٩P"));
    }

    #[test]
    fn test_resolve_alias_hit() {
        let resolved = resolve(SymbolKind::Code128, "3009P", &table());
        assert_eq!(resolved.label, "21008고진우");
        assert!(resolved.is_aliased);
    }

    #[test]
    fn test_resolve_unmapped_falls_back() {
        let resolved = resolve(SymbolKind::Code128, "9999Z", &table());
        assert_eq!(resolved.label, "CODE128: 9999Z");
        assert!(!resolved.is_aliased);
    }

    #[test]
    fn test_resolve_pattern_miss_skips_lookup() {
        let aliases: AliasTable = [("abc".to_string(), "별명".to_string())]
            .into_iter()
            .collect();
        let resolved = resolve(SymbolKind::Code128, "abc", &aliases);
        assert_eq!(resolved.label, "CODE128: abc");
        assert!(!resolved.is_aliased);
    }

    #[test]
    fn test_resolve_only_code128_is_aliased() {
        let resolved = resolve(SymbolKind::QrCode, "3009P", &table());
        assert_eq!(resolved.label, "QRCODE: 3009P");
        assert!(!resolved.is_aliased);
    }
}
