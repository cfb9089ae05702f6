//! Multiplier-to-DSP recognition rules.

use std::fmt::Write as _;

/// One `mul2dsp` shape: multipliers whose operands reach the minimum widths
/// are claimed and decomposed into `name` cells of at most the maximum widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DspRule {
    pub a_maxwidth: usize,
    pub b_maxwidth: usize,
    pub a_minwidth: usize,
    pub b_minwidth: usize,
    pub y_minwidth: Option<usize>,
    pub name: &'static str,
}

/// The single fixed-shape rule of `qlf_k6n10`.
pub const K6N10_DSP_RULE: DspRule = DspRule {
    a_maxwidth: 16,
    b_maxwidth: 16,
    a_minwidth: 2,
    b_minwidth: 2,
    y_minwidth: Some(11),
    name: "$__MUL16X16",
};

/// `qlf_k6n10f` rules, widest first so large products are claimed before
/// their sub-patterns.
pub const K6N10F_DSP_RULES: &[DspRule] = &[
    DspRule {
        a_maxwidth: 20,
        b_maxwidth: 18,
        a_minwidth: 11,
        b_minwidth: 10,
        y_minwidth: None,
        name: "$__QL_MUL20X18",
    },
    DspRule {
        a_maxwidth: 10,
        b_maxwidth: 9,
        a_minwidth: 4,
        b_minwidth: 4,
        y_minwidth: None,
        name: "$__QL_MUL10X9",
    },
];

impl DspRule {
    /// The `-D` defines passed to `techmap` for this rule.
    pub fn defines(&self) -> String {
        let mut out = format!(
            "-D DSP_A_MAXWIDTH={} -D DSP_B_MAXWIDTH={} -D DSP_A_MINWIDTH={} -D DSP_B_MINWIDTH={}",
            self.a_maxwidth, self.b_maxwidth, self.a_minwidth, self.b_minwidth
        );
        if let Some(y) = self.y_minwidth {
            let _ = write!(out, " -D DSP_Y_MINWIDTH={y}");
        }
        let _ = write!(out, " -D DSP_NAME={}", self.name);
        out
    }

    /// Whether an `a`×`b` multiplier is large enough for this rule. Operands
    /// may be swapped, as `mul2dsp` does.
    pub fn accepts(&self, a: usize, b: usize) -> bool {
        let fits = |a: usize, b: usize| a >= self.a_minwidth && b >= self.b_minwidth;
        let y_ok = self.y_minwidth.map_or(true, |y| a + b >= y);
        y_ok && (fits(a, b) || fits(b, a))
    }
}

/// The rule that claims an `a`×`b` multiplier when `rules` are applied in
/// order, or `None` if it stays a soft multiplier.
pub fn bind_multiplier(rules: &[DspRule], a: usize, b: usize) -> Option<&DspRule> {
    rules.iter().find(|rule| rule.accepts(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_strictly_descending(rules: &[DspRule]) -> bool {
        let area = |r: &DspRule| r.a_maxwidth * r.b_maxwidth;
        rules.windows(2).all(|w| {
            area(&w[0]) > area(&w[1])
                && w[0].a_maxwidth >= w[1].a_maxwidth
                && w[0].b_maxwidth >= w[1].b_maxwidth
        })
    }

    #[test]
    fn k6n10f_rules_are_descending() {
        assert!(is_strictly_descending(K6N10F_DSP_RULES));
        let mut reversed = K6N10F_DSP_RULES.to_vec();
        reversed.reverse();
        assert!(!is_strictly_descending(&reversed));
    }

    #[test]
    fn wide_multiplier_binds_to_wide_rule_only() {
        // 24x20 meets the minimums of both rules.
        assert!(K6N10F_DSP_RULES[0].accepts(24, 20));
        assert!(K6N10F_DSP_RULES[1].accepts(24, 20));
        let rule = bind_multiplier(K6N10F_DSP_RULES, 24, 20).unwrap();
        assert_eq!(rule.name, "$__QL_MUL20X18");
    }

    #[test]
    fn narrow_multiplier_binds_to_narrow_rule() {
        let rule = bind_multiplier(K6N10F_DSP_RULES, 8, 6).unwrap();
        assert_eq!(rule.name, "$__QL_MUL10X9");
    }

    #[test]
    fn operands_may_swap() {
        // 10x12 only fits the wide rule as 12x10.
        let rule = bind_multiplier(K6N10F_DSP_RULES, 10, 12).unwrap();
        assert_eq!(rule.name, "$__QL_MUL20X18");
    }

    #[test]
    fn tiny_multiplier_stays_soft() {
        assert!(bind_multiplier(K6N10F_DSP_RULES, 3, 3).is_none());
    }

    #[test]
    fn k6n10_rule_checks_product_width() {
        assert!(!K6N10_DSP_RULE.accepts(4, 4));
        assert!(K6N10_DSP_RULE.accepts(6, 6));
    }

    #[test]
    fn defines_match_techmap_syntax() {
        assert_eq!(
            K6N10F_DSP_RULES[1].defines(),
            "-D DSP_A_MAXWIDTH=10 -D DSP_B_MAXWIDTH=9 -D DSP_A_MINWIDTH=4 -D DSP_B_MINWIDTH=4 -D DSP_NAME=$__QL_MUL10X9"
        );
        assert!(K6N10_DSP_RULE
            .defines()
            .ends_with("-D DSP_Y_MINWIDTH=11 -D DSP_NAME=$__MUL16X16"));
    }
}
