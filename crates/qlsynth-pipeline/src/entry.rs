//! Entry controller: turns a flag set into a [`RunRequest`] and runs it once.

use serde::{Deserialize, Serialize};

use qlsynth_types::{Family, Result, SynthConfig, SynthError, Toggles};

use crate::engine::{PipelineExecutor, PipelineResult, RunRequest};
use crate::invoker::Design;
use crate::window::RunWindow;

/// The external flag set of one synthesis request, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthOptions {
    pub top: Option<String>,
    /// Family name as given; checked against the closed set in
    /// [`into_request`](Self::into_request).
    pub family: String,
    /// Resume window as `from[:to]`.
    pub run: Option<String>,
    pub blif_file: Option<String>,
    pub edif_file: Option<String>,
    pub verilog_file: Option<String>,
    #[serde(default)]
    pub toggles: Toggles,
    pub lib_path: Option<String>,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            top: None,
            family: Family::default().name().to_string(),
            run: None,
            blif_file: None,
            edif_file: None,
            verilog_file: None,
            toggles: Toggles::default(),
            lib_path: None,
        }
    }
}

impl SynthOptions {
    /// Parse yosys-style pass arguments such as
    /// `["-family", "pp3", "-top", "cpu", "-no_abc9"]`.
    pub fn from_pass_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut opts = Self::default();
        let mut iter = args.iter().map(|a| a.as_ref());
        while let Some(arg) = iter.next() {
            let mut value = || {
                iter.next().map(str::to_string).ok_or_else(|| SynthError::InvalidArgument {
                    flag: arg.to_string(),
                    message: "missing value".to_string(),
                })
            };
            match arg {
                "-top" => opts.top = Some(value()?),
                "-family" => opts.family = value()?,
                "-run" => opts.run = Some(value()?),
                "-blif" => opts.blif_file = Some(value()?),
                "-edif" => opts.edif_file = Some(value()?),
                "-verilog" => opts.verilog_file = Some(value()?),
                "-lib_path" => opts.lib_path = Some(value()?),
                "-no_dsp" => opts.toggles.no_dsp = true,
                "-use_dsp_cfg_params" => opts.toggles.use_dsp_cfg_params = true,
                "-no_adder" => opts.toggles.no_adder = true,
                "-no_bram" => opts.toggles.no_bram = true,
                "-bram_types" => opts.toggles.bram_types = true,
                "-no_ff_map" => opts.toggles.no_ff_map = true,
                "-nosdff" => opts.toggles.no_sdff = true,
                "-no_abc_opt" => opts.toggles.no_abc_opt = true,
                "-no_abc9" => opts.toggles.no_abc9 = true,
                other => {
                    return Err(SynthError::InvalidArgument {
                        flag: other.to_string(),
                        message: "unrecognized option".to_string(),
                    })
                }
            }
        }
        Ok(opts)
    }

    /// Validate the family and build the configuration.
    pub fn config(&self) -> Result<SynthConfig> {
        let family: Family = self.family.parse()?;
        Ok(SynthConfig {
            family,
            top: self.top.clone().filter(|t| !t.is_empty()),
            blif_file: self.blif_file.clone(),
            edif_file: self.edif_file.clone(),
            verilog_file: self.verilog_file.clone(),
            toggles: self.toggles,
        })
    }

    pub fn window(&self) -> Result<RunWindow> {
        match &self.run {
            Some(spec) => RunWindow::parse(spec),
            None => Ok(RunWindow::full()),
        }
    }

    /// Family first, then the window; nothing runs if either is invalid.
    pub fn into_request(&self) -> Result<RunRequest> {
        let mut request = RunRequest::new(self.config()?).with_window(self.window()?);
        request.lib_path = self.lib_path.clone();
        Ok(request)
    }
}

/// Validate `options` and run the pipeline exactly once on `design`.
pub fn synthesize<D: Design + ?Sized>(
    executor: &PipelineExecutor,
    design: &mut D,
    options: &SynthOptions,
) -> Result<PipelineResult> {
    let request = options.into_request()?;
    executor.run(design, &request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlsynth_types::Label;

    #[test]
    fn defaults_match_documented_values() {
        let opts = SynthOptions::default();
        let cfg = opts.config().unwrap();
        assert_eq!(cfg.family, Family::QlfK4n8);
        assert_eq!(cfg.top_option(), "-auto-top");
        assert_eq!(cfg.toggles, Toggles::default());
        assert!(opts.window().unwrap().is_full());
    }

    #[test]
    fn pass_args_set_values_and_toggles() {
        let opts = SynthOptions::from_pass_args(&[
            "-family", "qlf_k6n10f", "-top", "soc", "-run", "begin:map_luts", "-edif",
            "soc.edif", "-bram_types", "-nosdff", "-no_abc9",
        ])
        .unwrap();
        let request = opts.into_request().unwrap();
        assert_eq!(request.config.family, Family::QlfK6n10f);
        assert_eq!(request.config.top.as_deref(), Some("soc"));
        assert_eq!(request.config.edif(), Some("soc.edif"));
        assert!(request.config.toggles.bram_types);
        assert!(request.config.toggles.no_sdff);
        assert!(request.config.toggles.no_abc9);
        assert!(!request.config.toggles.no_dsp);
        assert_eq!(request.window.to, Label::MapLuts);
    }

    #[test]
    fn unknown_argument_is_rejected() {
        let err = SynthOptions::from_pass_args(&["-family", "pp3", "-fast"]).unwrap_err();
        match err {
            SynthError::InvalidArgument { flag, .. } => assert_eq!(flag, "-fast"),
            other => panic!("Expected InvalidArgument, got: {other:?}"),
        }
    }

    #[test]
    fn missing_value_is_rejected() {
        let err = SynthOptions::from_pass_args(&["-top"]).unwrap_err();
        assert!(matches!(err, SynthError::InvalidArgument { ref message, .. } if message == "missing value"));
    }

    #[test]
    fn invalid_family_is_a_precondition_error() {
        let opts = SynthOptions {
            family: "ice40".into(),
            ..SynthOptions::default()
        };
        let err = opts.into_request().unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(err.to_string(), "Invalid family specified: 'ice40'");
    }

    #[test]
    fn empty_top_means_auto_detect() {
        let opts = SynthOptions {
            top: Some(String::new()),
            ..SynthOptions::default()
        };
        assert_eq!(opts.config().unwrap().top, None);
    }
}
