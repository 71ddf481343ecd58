//! Region-aware loyalty/discount classification (spec §4.2 "Loyalty policy
//! by region")
//!
//! The POS vendor encodes which part of a discount was loyalty redemption
//! in free-text discount-line reasons, and the convention differs by
//! region. Rather than a pile of ad-hoc `if reason.contains(...)` checks,
//! classification is a small ordered rule table with deterministic
//! first-match semantics (spec §9 "Regex-sniffed loyalty policy").

/// What a matched discount line contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountLineClass {
    /// The matched amount is loyalty-point redemption.
    Loyalty,
    /// The matched amount is an ordinary promotional discount, not loyalty,
    /// even though the text mentions "loyalty" (the Florida pattern).
    PlainDiscount,
}

enum Matcher {
    Prefix(&'static str),
    Suffix(&'static str),
}

struct Rule {
    matcher: Matcher,
    class: DiscountLineClass,
}

/// Ordered loyalty classification rules, first match wins.
fn rules() -> &'static [Rule] {
    const RULES: &[Rule] = &[
        // Missouri: "* Loyalty 10"
        Rule {
            matcher: Matcher::Prefix("* LOYALTY"),
            class: DiscountLineClass::Loyalty,
        },
        // Illinois: "Dutchie Loyalty ..."
        Rule {
            matcher: Matcher::Prefix("DUTCHIE LOYALTY"),
            class: DiscountLineClass::Loyalty,
        },
        Rule {
            matcher: Matcher::Prefix("LOYALTY APPLIED"),
            class: DiscountLineClass::Loyalty,
        },
        // Florida: "5 Loyalty Points" — counts as a plain discount.
        Rule {
            matcher: Matcher::Suffix("LOYALTY POINTS"),
            class: DiscountLineClass::PlainDiscount,
        },
    ];
    RULES
}

/// Classify a discount-line reason string, case-insensitively. Returns
/// `None` if no rule matches (the line is an ordinary discount with no
/// loyalty implication either way).
pub fn classify(reason: &str) -> Option<DiscountLineClass> {
    let upper = reason.trim().to_uppercase();
    for rule in rules() {
        let matched = match rule.matcher {
            Matcher::Prefix(p) => upper.starts_with(p),
            Matcher::Suffix(s) => upper.ends_with(s),
        };
        if matched {
            return Some(rule.class);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missouri_star_loyalty_prefix_classifies_as_loyalty() {
        assert_eq!(classify("* Loyalty 10"), Some(DiscountLineClass::Loyalty));
    }

    #[test]
    fn illinois_dutchie_loyalty_classifies_as_loyalty() {
        assert_eq!(
            classify("Dutchie Loyalty Redemption"),
            Some(DiscountLineClass::Loyalty)
        );
    }

    #[test]
    fn loyalty_applied_classifies_as_loyalty() {
        assert_eq!(classify("LOYALTY APPLIED"), Some(DiscountLineClass::Loyalty));
    }

    #[test]
    fn florida_loyalty_points_suffix_is_plain_discount() {
        assert_eq!(
            classify("5 Loyalty Points"),
            Some(DiscountLineClass::PlainDiscount)
        );
    }

    #[test]
    fn unrecognized_reason_returns_none() {
        assert_eq!(classify("Manager Comp"), None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("dutchie loyalty x"), Some(DiscountLineClass::Loyalty));
    }
}
