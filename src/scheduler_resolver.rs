//! Resolves an algorithm name (optionally with `[k=v,...]` parameters) to a concrete scheduler
//! instance, the way an experiment harness picks an algorithm by configuration string
//! rather than by importing every scheduler type directly.
//!
//! `SchedulerParams::from_str` parses `"Name[k=v,...]"`, and a resolver function matches
//! `name()` against every known scheduler.

use std::collections::BTreeMap;
use std::str::FromStr;

use itertools::Itertools;

use crate::scheduler::{DynamicScheduler, StaticScheduler};
use crate::schedulers::batch::{BatchKind, BatchScheduler, DynamicBatchScheduler};
use crate::schedulers::dls::DlsScheduler;
use crate::schedulers::hcpt::HcptScheduler;
use crate::schedulers::heft::HeftScheduler;
use crate::schedulers::ldcp::LdcpScheduler;
use crate::schedulers::lookahead::LookaheadScheduler;
use crate::schedulers::mct::{DynamicMctScheduler, MctScheduler};
use crate::schedulers::olb::{OlbScheduler, StaticOlbScheduler};
use crate::schedulers::peft::PeftScheduler;
use crate::schedulers::random_rr::{RandomScheduler, RoundRobinScheduler};

/// A parsed `"Name[k=v,...]"` scheduler specification.
#[derive(Debug, Clone)]
pub struct SchedulerParams {
    name: String,
    params: BTreeMap<String, String>,
}

impl SchedulerParams {
    pub fn from_str(s: &str) -> Option<Self> {
        let Some(open) = s.find('[') else {
            return Some(Self {
                name: s.to_string(),
                params: BTreeMap::new(),
            });
        };
        if !s.ends_with(']') {
            return None;
        }

        let mut params = BTreeMap::new();
        for param in s[open + 1..s.len() - 1].split(',') {
            let pos = param.find('=')?;
            params.insert(param[..pos].to_string(), param[pos + 1..].to_string());
        }

        Some(Self {
            name: s[..open].to_string(),
            params,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get<T: FromStr, K: AsRef<str>>(&self, name: K) -> Option<T> {
        self.params.get(name.as_ref()).and_then(|s| s.parse().ok())
    }
}

impl std::fmt::Display for SchedulerParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(
                f,
                "{}[{}]",
                self.name,
                self.params.iter().map(|(k, v)| format!("{k}={v}")).join(",")
            )
        }
    }
}

/// Resolves `params.name()` to a boxed [`StaticScheduler`], or `None` if unknown.
pub fn resolve_static(params: &SchedulerParams) -> Option<Box<dyn StaticScheduler>> {
    match params.name() {
        "OLB" => Some(Box::new(StaticOlbScheduler::new())),
        "MCT" => Some(Box::new(MctScheduler::new())),
        "MinMin" => Some(Box::new(BatchScheduler::new(BatchKind::MinMin))),
        "MaxMin" => Some(Box::new(BatchScheduler::new(BatchKind::MaxMin))),
        "Sufferage" => Some(Box::new(BatchScheduler::new(BatchKind::Sufferage))),
        "DLS" => Some(Box::new(DlsScheduler::new())),
        "HCPT" => Some(Box::new(HcptScheduler::new())),
        "HEFT" => Some(Box::new(HeftScheduler::new())),
        "Lookahead" => Some(Box::new(LookaheadScheduler::new())),
        "PEFT" => Some(Box::new(PeftScheduler::new())),
        "LDCP" => Some(Box::new(LdcpScheduler::new())),
        "Random" => Some(Box::new(RandomScheduler::new(params.get("seed").unwrap_or(0)))),
        "RoundRobin" => Some(Box::new(RoundRobinScheduler::new())),
        _ => None,
    }
}

/// Resolves `params.name()` to a boxed [`DynamicScheduler`], or `None` if unknown.
pub fn resolve_dynamic(params: &SchedulerParams) -> Option<Box<dyn DynamicScheduler>> {
    match params.name() {
        "DynamicOLB" => Some(Box::new(OlbScheduler::new())),
        "DynamicMCT" => Some(Box::new(DynamicMctScheduler::new())),
        "DynamicMinMin" => Some(Box::new(DynamicBatchScheduler::new(BatchKind::MinMin))),
        "DynamicMaxMin" => Some(Box::new(DynamicBatchScheduler::new(BatchKind::MaxMin))),
        "DynamicSufferage" => Some(Box::new(DynamicBatchScheduler::new(BatchKind::Sufferage))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_without_params() {
        let params = SchedulerParams::from_str("HEFT").unwrap();
        assert_eq!(params.name(), "HEFT");
        assert_eq!(params.to_string(), "HEFT");
    }

    #[test]
    fn parses_name_with_params() {
        let params = SchedulerParams::from_str("Random[seed=7]").unwrap();
        assert_eq!(params.name(), "Random");
        assert_eq!(params.get::<u64, _>("seed"), Some(7));
    }

    #[test]
    fn rejects_unterminated_param_list() {
        assert!(SchedulerParams::from_str("Random[seed=7").is_none());
    }

    #[test]
    fn resolves_every_known_static_algorithm() {
        for name in [
            "OLB", "MCT", "MinMin", "MaxMin", "Sufferage", "DLS", "HCPT", "HEFT", "Lookahead", "PEFT", "LDCP", "Random",
            "RoundRobin",
        ] {
            let params = SchedulerParams::from_str(name).unwrap();
            assert!(resolve_static(&params).is_some(), "expected {name} to resolve");
        }
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let params = SchedulerParams::from_str("NoSuchAlgorithm").unwrap();
        assert!(resolve_static(&params).is_none());
        assert!(resolve_dynamic(&params).is_none());
    }
}
