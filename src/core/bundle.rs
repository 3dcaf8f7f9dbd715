use crate::domain::artifacts::{
    DiffusionMatrix, DiffusionTerms, IntegratorStep, Iterators, Jacobian, MeasurementJacobian,
    ObservationGradients, Observed, Orders, Parameters, ResamplingAlloc, ResamplingIncrement,
    ResamplingMultinomial, ResamplingStep, WhiteNoise,
};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// 產生的 C 模組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    OdeSde,
    Transform,
    Input,
    Observed,
    Iterator,
    Psr,
    Diff,
    Q,
    Ht,
    Jac,
    StepEkf,
    CheckIc,
}

impl Module {
    pub const ALL: [Module; 12] = [
        Module::OdeSde,
        Module::Transform,
        Module::Input,
        Module::Observed,
        Module::Iterator,
        Module::Psr,
        Module::Diff,
        Module::Q,
        Module::Ht,
        Module::Jac,
        Module::StepEkf,
        Module::CheckIc,
    ];

    pub fn stem(&self) -> &'static str {
        match self {
            Module::OdeSde => "ode_sde",
            Module::Transform => "transform",
            Module::Input => "input",
            Module::Observed => "observed",
            Module::Iterator => "iterator",
            Module::Psr => "psr",
            Module::Diff => "diff",
            Module::Q => "Q",
            Module::Ht => "Ht",
            Module::Jac => "jac",
            Module::StepEkf => "step_ekf",
            Module::CheckIc => "check_ic",
        }
    }

    pub fn template_file_name(&self) -> String {
        format!("{}_template.c", self.stem())
    }

    pub fn output_file_name(&self) -> String {
        format!("{}.c", self.stem())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}

/// 單一模組的樣板輸入。共用的產物以 `Arc` 持有，重複使用時指向同一份值。
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ModuleBundle {
    /// ode_sde 與 step_ekf
    Integration {
        is_diff: bool,
        step: Arc<IntegratorStep>,
        orders: Arc<Orders>,
    },
    /// transform、input 與 check_ic
    Parameters {
        #[serde(flatten)]
        parameters: Arc<Parameters>,
        orders: Arc<Orders>,
    },
    Observed {
        #[serde(flatten)]
        observed: Observed,
        orders: Arc<Orders>,
        h_grads: ObservationGradients,
    },
    Iterators {
        iterators: Iterators,
    },
    Resampling {
        orders: Arc<Orders>,
        alloc: ResamplingAlloc,
        is_diff: bool,
        white_noise: WhiteNoise,
        step: ResamplingStep,
        step_inc: ResamplingIncrement,
        psr_multinomial: ResamplingMultinomial,
    },
    DiffusionSum {
        diff: DiffusionTerms,
        orders: Arc<Orders>,
    },
    DiffusionMatrix {
        #[serde(rename = "Q")]
        q: DiffusionMatrix,
        is_diff: bool,
        orders: Arc<Orders>,
    },
    MeasurementJacobian {
        #[serde(rename = "Ht")]
        ht: MeasurementJacobian,
        is_diff: bool,
        orders: Arc<Orders>,
    },
    Jacobian {
        jac: Jacobian,
        is_diff: bool,
        orders: Arc<Orders>,
    },
}

impl ModuleBundle {
    /// 不使用擴散旗標的 bundle 回傳 `None`
    pub fn is_diff(&self) -> Option<bool> {
        match self {
            ModuleBundle::Integration { is_diff, .. }
            | ModuleBundle::Resampling { is_diff, .. }
            | ModuleBundle::DiffusionMatrix { is_diff, .. }
            | ModuleBundle::MeasurementJacobian { is_diff, .. }
            | ModuleBundle::Jacobian { is_diff, .. } => Some(*is_diff),
            _ => None,
        }
    }

    pub fn step(&self) -> Option<&Arc<IntegratorStep>> {
        match self {
            ModuleBundle::Integration { step, .. } => Some(step),
            _ => None,
        }
    }

    pub fn orders(&self) -> Option<&Arc<Orders>> {
        match self {
            ModuleBundle::Integration { orders, .. }
            | ModuleBundle::Parameters { orders, .. }
            | ModuleBundle::Observed { orders, .. }
            | ModuleBundle::Resampling { orders, .. }
            | ModuleBundle::DiffusionSum { orders, .. }
            | ModuleBundle::DiffusionMatrix { orders, .. }
            | ModuleBundle::MeasurementJacobian { orders, .. }
            | ModuleBundle::Jacobian { orders, .. } => Some(orders),
            ModuleBundle::Iterators { .. } => None,
        }
    }

    pub fn to_context(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedModule {
    pub module: Module,
    pub path: PathBuf,
    pub bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_module_file_names() {
        assert_eq!(Module::Q.template_file_name(), "Q_template.c");
        assert_eq!(Module::StepEkf.output_file_name(), "step_ekf.c");
        assert_eq!(Module::CheckIc.to_string(), "check_ic");
        assert_eq!(Module::ALL.len(), 12);
    }

    #[test]
    fn test_parameters_bundle_flattens_record() {
        let parameters = Parameters {
            states: vec!["S".to_string(), "I".to_string()],
            ..Default::default()
        };
        let orders = Orders {
            order_states: BTreeMap::from([("S".to_string(), 0), ("I".to_string(), 1)]),
            ..Default::default()
        };
        let bundle = ModuleBundle::Parameters {
            parameters: Arc::new(parameters),
            orders: Arc::new(orders),
        };

        let context = bundle.to_context().unwrap();
        assert_eq!(context["states"][1], "I");
        assert_eq!(context["orders"]["order_states"]["I"], 1);
        assert_eq!(bundle.is_diff(), None);
    }

    #[test]
    fn test_matrix_bundles_use_uppercase_keys() {
        let bundle = ModuleBundle::DiffusionMatrix {
            q: DiffusionMatrix::default(),
            is_diff: false,
            orders: Arc::new(Orders::default()),
        };

        let context = bundle.to_context().unwrap();
        assert!(context.get("Q").is_some());
        assert_eq!(context["is_diff"], false);
        assert_eq!(bundle.is_diff(), Some(false));
    }
}
