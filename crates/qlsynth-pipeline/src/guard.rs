//! Predicates deciding whether a stage, step or argument fragment applies to
//! a configuration.

use qlsynth_types::{Family, SynthConfig};

/// A boolean property of a [`SynthConfig`], named after the option that
/// sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    NoDsp,
    UseDspCfgParams,
    NoAdder,
    NoBram,
    BramTypes,
    NoFfMap,
    NoSdff,
    NoAbcOpt,
    NoAbc9,
    Blif,
    Edif,
    Verilog,
}

impl Flag {
    pub fn holds(self, cfg: &SynthConfig) -> bool {
        let t = &cfg.toggles;
        match self {
            Flag::NoDsp => t.no_dsp,
            Flag::UseDspCfgParams => t.use_dsp_cfg_params,
            Flag::NoAdder => t.no_adder,
            Flag::NoBram => t.no_bram,
            Flag::BramTypes => t.bram_types,
            Flag::NoFfMap => t.no_ff_map,
            Flag::NoSdff => t.no_sdff,
            Flag::NoAbcOpt => t.no_abc_opt,
            Flag::NoAbc9 => t.no_abc9,
            Flag::Blif => cfg.blif().is_some(),
            Flag::Edif => cfg.edif().is_some(),
            Flag::Verilog => cfg.verilog().is_some(),
        }
    }

    /// The command-line option behind this flag.
    pub fn option(self) -> &'static str {
        match self {
            Flag::NoDsp => "-no_dsp",
            Flag::UseDspCfgParams => "-use_dsp_cfg_params",
            Flag::NoAdder => "-no_adder",
            Flag::NoBram => "-no_bram",
            Flag::BramTypes => "-bram_types",
            Flag::NoFfMap => "-no_ff_map",
            Flag::NoSdff => "-nosdff",
            Flag::NoAbcOpt => "-no_abc_opt",
            Flag::NoAbc9 => "-no_abc9",
            Flag::Blif => "-blif",
            Flag::Edif => "-edif",
            Flag::Verilog => "-verilog",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Always,
    Family(Vec<Family>),
    Set(Flag),
    Unset(Flag),
    All(Vec<Guard>),
    Any(Vec<Guard>),
}

impl Guard {
    pub fn families(families: &[Family]) -> Self {
        Guard::Family(families.to_vec())
    }

    pub fn family(family: Family) -> Self {
        Guard::Family(vec![family])
    }

    /// Conjunction, flattening nested `All`s and dropping `Always`.
    pub fn and(self, other: Guard) -> Self {
        let mut parts = Vec::new();
        for g in [self, other] {
            match g {
                Guard::Always => {}
                Guard::All(inner) => parts.extend(inner),
                g => parts.push(g),
            }
        }
        match parts.len() {
            0 => Guard::Always,
            1 => parts.remove(0),
            _ => Guard::All(parts),
        }
    }

    pub fn or(self, other: Guard) -> Self {
        Guard::Any(vec![self, other])
    }

    pub fn holds(&self, cfg: &SynthConfig) -> bool {
        match self {
            Guard::Always => true,
            Guard::Family(families) => families.contains(&cfg.family),
            Guard::Set(flag) => flag.holds(cfg),
            Guard::Unset(flag) => !flag.holds(cfg),
            Guard::All(guards) => guards.iter().all(|g| g.holds(cfg)),
            Guard::Any(guards) => guards.iter().any(|g| g.holds(cfg)),
        }
    }

    /// Whether the guard restricts by family anywhere.
    #[cfg(test)]
    pub(crate) fn mentions_family(&self, family: Family) -> bool {
        match self {
            Guard::Family(families) => families.contains(&family),
            Guard::All(guards) | Guard::Any(guards) => {
                guards.iter().any(|g| g.mentions_family(family))
            }
            _ => false,
        }
    }

    /// Human-readable condition for help output, `None` for [`Guard::Always`].
    pub fn describe(&self) -> Option<String> {
        match self {
            Guard::Always => None,
            Guard::Family(families) => Some(format!(
                "for {}",
                families.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
            )),
            Guard::Set(flag) => Some(format!("if {}", flag.option())),
            Guard::Unset(flag) => Some(format!("unless {}", flag.option())),
            Guard::All(guards) => join(guards, ", "),
            Guard::Any(guards) => join(guards, " or "),
        }
    }
}

fn join(guards: &[Guard], sep: &str) -> Option<String> {
    let parts: Vec<String> = guards.iter().filter_map(Guard::describe).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(sep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_guard() {
        let g = Guard::families(&[Family::Pp3, Family::QlfK6n10]);
        assert!(g.holds(&SynthConfig::new(Family::Pp3)));
        assert!(!g.holds(&SynthConfig::new(Family::QlfK4n8)));
        assert_eq!(g.describe().unwrap(), "for pp3, qlf_k6n10");
    }

    #[test]
    fn flag_guards() {
        let mut cfg = SynthConfig::new(Family::QlfK6n10f);
        let unless = Guard::Unset(Flag::NoAdder);
        assert!(unless.holds(&cfg));
        cfg.toggles.no_adder = true;
        assert!(!unless.holds(&cfg));
        assert_eq!(unless.describe().unwrap(), "unless -no_adder");
    }

    #[test]
    fn output_flags_follow_non_empty_paths() {
        let mut cfg = SynthConfig::default();
        assert!(!Flag::Blif.holds(&cfg));
        cfg.blif_file = Some(String::new());
        assert!(!Flag::Blif.holds(&cfg));
        cfg.blif_file = Some("top.blif".into());
        assert!(Flag::Blif.holds(&cfg));
    }

    #[test]
    fn and_flattens() {
        let g = Guard::family(Family::QlfK6n10f)
            .and(Guard::Unset(Flag::NoDsp))
            .and(Guard::Always)
            .and(Guard::Set(Flag::UseDspCfgParams));
        match &g {
            Guard::All(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected All, got {other:?}"),
        }
        assert_eq!(
            g.describe().unwrap(),
            "for qlf_k6n10f, unless -no_dsp, if -use_dsp_cfg_params"
        );
        assert_eq!(Guard::Always.and(Guard::Always), Guard::Always);
    }

    #[test]
    fn any_describes_with_or() {
        let g = Guard::family(Family::Pp3).or(Guard::Set(Flag::Edif));
        assert_eq!(g.describe().unwrap(), "for pp3 or if -edif");
        let mut cfg = SynthConfig::new(Family::QlfK4n8);
        assert!(!g.holds(&cfg));
        cfg.edif_file = Some("top.edif".into());
        assert!(g.holds(&cfg));
    }

    #[test]
    fn mentions_family_looks_through_combinators() {
        let g = Guard::family(Family::QlfK6n10).and(Guard::Unset(Flag::NoAbc9));
        assert!(g.mentions_family(Family::QlfK6n10));
        assert!(!g.mentions_family(Family::Pp3));
    }
}
