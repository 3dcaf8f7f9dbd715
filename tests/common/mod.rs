#![allow(dead_code)]

use ssm_build::core::{ArtifactComputer, ModelData, ModelSpec, ObservationStream, Renderer};
use ssm_build::domain::artifacts::*;
use ssm_build::{Module, ModuleBundle, RenderedModule, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub fn sample_spec(par_diff: &[&str], observations: &[&str]) -> ModelSpec {
    let spec = serde_json::json!({
        "name": "sir",
        "parameters": ["r0", "v", "vol", "rep"],
        "par_diff": par_diff,
        "observations": observations
            .iter()
            .map(|name| serde_json::json!({"name": name}))
            .collect::<Vec<_>>(),
        "order_states": {"S": 0, "I": 1, "R": 2, "Inc_out": 3, "Inc_in": 4},
        "t0": "2012-07-26T00:00:00"
    });
    serde_json::from_value(spec).unwrap()
}

/// 每個模組一個樣板，只引用該模組 bundle 內的鍵
pub fn module_templates() -> Vec<(Module, &'static str)> {
    vec![
        (Module::OdeSde, "/* ode_sde */\nint is_diff = {{ is_diff }};\nint n_sf = {{ step.sf|length }}; // {{ step.sf[0] }}\n"),
        (Module::Transform, "{% extends \"ordered.tpl\" %}{% block code %}/* transform */ {{ states|length }} states, first {{ states[0] }} at {{ orders.order_states.S }}\n{% endblock %}"),
        (Module::Input, "/* input */ {{ pars|length }} parameters\n"),
        (Module::Observed, "/* observed */ {{ observed|length }} streams, grads {{ h_grads.grads }}\n"),
        (Module::Iterator, "/* iterator */ {{ iterators.par_sv }}\n"),
        (Module::Psr, "/* psr */ {{ is_diff }} {{ alloc.allocations|length }} {{ step.sf|length }} {{ white_noise.terms|length }} {{ psr_multinomial.draws|length }}\n"),
        (Module::Diff, "/* diff */ {{ diff.terms|length }} {{ orders.order_states|length }}\n"),
        (Module::Q, "/* Q */ is_diff={{ is_diff }} sys={{ Q.sys|length }}\n"),
        (Module::Ht, "/* Ht */ is_diff={{ is_diff }} rows={{ Ht.rows|length }}\n"),
        (Module::Jac, "/* jac */ is_diff={{ is_diff }} d={{ jac.jac[0][0] }}\n"),
        (Module::StepEkf, "/* step_ekf */ is_diff={{ is_diff }} cache={{ step.caches[0] }}\n"),
        (Module::CheckIc, "/* check_ic */ {{ par_sv|length }}\n"),
    ]
}

/// 建立一個模擬 C/templates 來源樹（含子目錄）
pub fn write_template_source(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir.join("include")).unwrap();
    for (module, body) in module_templates() {
        fs::write(dir.join(module.template_file_name()), body).unwrap();
    }
    fs::write(dir.join("include").join("ssm.h"), "#define SSM 1\n").unwrap();
    fs::write(dir.join("ordered.tpl"), "/* base layout */\n{% block code %}{% endblock %}").unwrap();
    dir.to_path_buf()
}

pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

pub fn read_all(root: &Path) -> BTreeMap<String, Vec<u8>> {
    list_files(root)
        .into_iter()
        .map(|f| {
            let bytes = fs::read(root.join(&f)).unwrap();
            (f, bytes)
        })
        .collect()
}

/// 固定輸出的 ArtifactComputer，記錄每個查詢被呼叫的次數
#[derive(Default)]
pub struct StubComputer {
    pub calls: RefCell<BTreeMap<&'static str, usize>>,
    pub fail_on: Option<&'static str>,
    pub jac_sf: RefCell<Option<Vec<String>>>,
}

impl StubComputer {
    pub fn failing_on(artifact: &'static str) -> Self {
        Self {
            fail_on: Some(artifact),
            ..Default::default()
        }
    }

    pub fn call_count(&self, artifact: &str) -> usize {
        self.calls.borrow().get(artifact).copied().unwrap_or(0)
    }

    fn hit(&self, artifact: &'static str) -> anyhow::Result<()> {
        *self.calls.borrow_mut().entry(artifact).or_insert(0) += 1;
        if self.fail_on == Some(artifact) {
            anyhow::bail!("stub failure in {}", artifact);
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ArtifactComputer for StubComputer {
    fn orders(&self, spec: &ModelSpec) -> anyhow::Result<Orders> {
        self.hit("orders")?;
        Ok(Orders {
            order_states: spec.order_states.clone(),
            order_parameters: spec
                .parameters
                .iter()
                .enumerate()
                .map(|(i, p)| (p.clone(), i))
                .collect(),
            order_observations: spec
                .observations
                .iter()
                .enumerate()
                .map(|(i, o)| (o.name.clone(), i))
                .collect(),
        })
    }

    fn step_ode_sde(&self, _spec: &ModelSpec) -> anyhow::Result<IntegratorStep> {
        self.hit("step_ode_sde")?;
        Ok(IntegratorStep {
            caches: strings(&["_r[0]*X[0]*X[1]"]),
            sf: strings(&["r0*S*I/N", "v*I"]),
            func: BTreeMap::new(),
        })
    }

    fn jac(&self, _spec: &ModelSpec, sf: &[String]) -> anyhow::Result<Jacobian> {
        self.hit("jac")?;
        *self.jac_sf.borrow_mut() = Some(sf.to_vec());
        Ok(Jacobian {
            jac: vec![strings(&["-r0*I/N", "-r0*S/N"])],
            ..Default::default()
        })
    }

    fn parameters(&self, spec: &ModelSpec) -> anyhow::Result<Parameters> {
        self.hit("parameters")?;
        Ok(Parameters {
            pars: spec.parameters.iter().map(|p| serde_json::json!({"name": p})).collect(),
            parameters: vec![
                serde_json::json!({"name": "r0", "data": {"data": {"distribution": "uniform", "lower": 1, "upper": 30}}}),
                serde_json::json!({"name": "v", "data": {"data": {"distribution": "normal", "mean": 0.1, "sd": 0.01}}}),
                serde_json::json!({"name": "rep", "data": {"data": 0.6}}),
            ],
            drifts: vec![serde_json::json!({"name": "vol", "transformation": "log", "f": "log(x)"})],
            states: strings(&["S", "I", "R"]),
            order_states: spec.order_states.clone(),
            remainders: strings(&["R"]),
            par_sv: strings(&["S", "I"]),
            f_remainders: [("R".to_string(), "N-S-I".to_string())].into_iter().collect(),
            ..Default::default()
        })
    }

    fn observed(&self, spec: &ModelSpec) -> anyhow::Result<Observed> {
        self.hit("observed")?;
        Ok(Observed {
            observed: spec
                .observations
                .iter()
                .map(|o| serde_json::json!({"name": o.name}))
                .collect(),
        })
    }

    fn h_grads(&self, _spec: &ModelSpec) -> anyhow::Result<ObservationGradients> {
        self.hit("h_grads")?;
        Ok(ObservationGradients::default())
    }

    fn iterators(&self, _spec: &ModelSpec) -> anyhow::Result<Iterators> {
        self.hit("iterators")?;
        Ok(Iterators {
            groups: BTreeMap::from([("par_sv".to_string(), vec![0, 1])]),
        })
    }

    fn alloc_psr(&self, _spec: &ModelSpec) -> anyhow::Result<ResamplingAlloc> {
        self.hit("alloc_psr")?;
        Ok(ResamplingAlloc::default())
    }

    fn step_psr(&self, _spec: &ModelSpec) -> anyhow::Result<ResamplingStep> {
        self.hit("step_psr")?;
        Ok(ResamplingStep {
            sf: strings(&["r0*S*I/N"]),
            ..Default::default()
        })
    }

    fn step_psr_inc(&self, _spec: &ModelSpec) -> anyhow::Result<ResamplingIncrement> {
        self.hit("step_psr_inc")?;
        Ok(ResamplingIncrement::default())
    }

    fn step_psr_multinomial(&self, _spec: &ModelSpec) -> anyhow::Result<ResamplingMultinomial> {
        self.hit("step_psr_multinomial")?;
        Ok(ResamplingMultinomial::default())
    }

    fn white_noise(&self, _spec: &ModelSpec) -> anyhow::Result<WhiteNoise> {
        self.hit("white_noise")?;
        Ok(WhiteNoise::default())
    }

    fn compute_diff(&self, _spec: &ModelSpec) -> anyhow::Result<DiffusionTerms> {
        self.hit("compute_diff")?;
        Ok(DiffusionTerms::default())
    }

    fn eval_q(&self, _spec: &ModelSpec) -> anyhow::Result<DiffusionMatrix> {
        self.hit("eval_q")?;
        Ok(DiffusionMatrix::default())
    }

    fn ht(&self, _spec: &ModelSpec) -> anyhow::Result<MeasurementJacobian> {
        self.hit("ht")?;
        Ok(MeasurementJacobian {
            rows: vec![strings(&["1", "0"])],
            ..Default::default()
        })
    }
}

pub struct StubData {
    pub resets: BTreeMap<String, Vec<String>>,
}

impl StubData {
    pub fn new(resets: &[(&str, &[&str])]) -> Self {
        Self {
            resets: resets
                .iter()
                .map(|(stream, states)| (stream.to_string(), strings(states)))
                .collect(),
        }
    }
}

impl ModelData for StubData {
    fn inc_reset(&self, stream: &ObservationStream) -> anyhow::Result<Vec<String>> {
        Ok(self.resets.get(&stream.name).cloned().unwrap_or_default())
    }

    fn prepared_data(&self) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::json!([
            {"date": "2012-08-02", "values": [12.0, null]},
            {"date": "2012-08-09", "values": [17.0, 4.0]}
        ]))
    }

    fn prepared_covariates(&self) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::json!({"N": [{"date": "2012-07-26", "value": 1000000}]}))
    }
}

/// 只記錄收到的 bundle，不寫檔
#[derive(Default)]
pub struct RecordingRenderer {
    pub calls: RefCell<Vec<(Module, ModuleBundle)>>,
}

impl Renderer for RecordingRenderer {
    fn render(&self, module: Module, bundle: &ModuleBundle) -> Result<RenderedModule> {
        self.calls.borrow_mut().push((module, bundle.clone()));
        Ok(RenderedModule {
            module,
            path: PathBuf::from(module.output_file_name()),
            bytes: 0,
        })
    }
}
