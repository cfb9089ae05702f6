//! CLI binary for running and documenting the qlsynth pipeline.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use qlsynth_pipeline::{
    clear_checkpoint, load_checkpoint, render_help_script, synthesize, PipelineConfig,
    PipelineExecutor, RunWindow, ScriptDesign, SynthOptions, DEFAULT_LIB_PATH,
};
use qlsynth_types::{Family, Toggles};

const DESIGN_FILE: &str = "design.json";

#[derive(Parser)]
#[command(name = "qlsynth", version, about = "Staged synthesis driver for QuickLogic FPGA families")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline against the design persisted in a state directory
    Run {
        #[command(flatten)]
        flags: SynthFlags,

        /// Directory holding design.json and checkpoint.json
        #[arg(long)]
        state_dir: PathBuf,

        /// Continue after the last checkpoint saved in the state directory
        #[arg(long, conflicts_with = "run")]
        resume: bool,

        /// Write the accumulated command log as a Yosys script
        #[arg(long)]
        script: Option<PathBuf>,
    },

    /// Print every command the pipeline may run, per checkpoint
    HelpScript {
        /// Technology library prefix used in the listing
        #[arg(long, default_value = DEFAULT_LIB_PATH)]
        lib_path: String,
    },

    /// List the supported device families
    Families,
}

#[derive(Args)]
struct SynthFlags {
    /// Use this module as top instead of auto-detecting it
    #[arg(long)]
    top: Option<String>,

    /// Target device family
    #[arg(long, default_value = "qlf_k4n8")]
    family: String,

    /// Only run checkpoints in this range, as from[:to]
    #[arg(long)]
    run: Option<String>,

    /// Write the netlist in BLIF format
    #[arg(long)]
    blif: Option<String>,

    /// Write the netlist in EDIF format
    #[arg(long)]
    edif: Option<String>,

    /// Write the netlist in Verilog format
    #[arg(long)]
    verilog: Option<String>,

    /// Technology library prefix (default: scratchpad ql.lib_path or +/quicklogic/)
    #[arg(long)]
    lib_path: Option<String>,

    /// Do not map multipliers to DSP blocks
    #[arg(long)]
    no_dsp: bool,

    /// Expose DSP configuration through parameters instead of ports
    #[arg(long)]
    use_dsp_cfg_params: bool,

    /// Do not use dedicated carry logic for adders
    #[arg(long)]
    no_adder: bool,

    /// Do not map memories to block RAM
    #[arg(long)]
    no_bram: bool,

    /// Re-type block RAM cells to width-specific variants
    #[arg(long)]
    bram_types: bool,

    /// Skip flip-flop technology mapping
    #[arg(long)]
    no_ff_map: bool,

    /// Do not infer synchronous set/reset flip-flops
    #[arg(long)]
    nosdff: bool,

    /// Skip LUT mapping
    #[arg(long)]
    no_abc_opt: bool,

    /// Use abc instead of abc9 for LUT mapping
    #[arg(long)]
    no_abc9: bool,
}

impl SynthFlags {
    fn into_options(self) -> SynthOptions {
        SynthOptions {
            top: self.top,
            family: self.family,
            run: self.run,
            blif_file: self.blif,
            edif_file: self.edif,
            verilog_file: self.verilog,
            lib_path: self.lib_path,
            toggles: Toggles {
                no_dsp: self.no_dsp,
                use_dsp_cfg_params: self.use_dsp_cfg_params,
                no_adder: self.no_adder,
                no_bram: self.no_bram,
                bram_types: self.bram_types,
                no_ff_map: self.no_ff_map,
                no_sdff: self.nosdff,
                no_abc_opt: self.no_abc_opt,
                no_abc9: self.no_abc9,
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            flags,
            state_dir,
            resume,
            script,
        } => {
            cmd_run(flags.into_options(), &state_dir, resume, script.as_deref())?;
        }
        Commands::HelpScript { lib_path } => {
            print!("{}", render_help_script(&lib_path));
        }
        Commands::Families => {
            cmd_families();
        }
    }

    Ok(())
}

fn cmd_run(
    mut options: SynthOptions,
    state_dir: &Path,
    resume: bool,
    script: Option<&Path>,
) -> anyhow::Result<()> {
    if resume {
        let checkpoint = load_checkpoint(state_dir)?
            .with_context(|| format!("no checkpoint in {}", state_dir.display()))?;
        checkpoint.ensure_family(options.family.parse::<Family>()?)?;
        let Some(next) = checkpoint.next_label else {
            println!("Run {} already finished", checkpoint.run_id);
            return Ok(());
        };
        let window = RunWindow::full().starting_at(next)?;
        println!("Resuming run {} at {}", checkpoint.run_id, next);
        options.run = Some(window.to_string());
    }

    let design_path = state_dir.join(DESIGN_FILE);
    let fresh = !resume && options.run.is_none();
    let mut design = if fresh {
        clear_checkpoint(state_dir)?;
        ScriptDesign::new()
    } else {
        ScriptDesign::load_or_new(&design_path)
            .with_context(|| format!("failed to load {}", design_path.display()))?
    };
    tracing::debug!(
        path = %design_path.display(),
        operations = design.commands().len(),
        "Design state loaded"
    );

    let executor = PipelineExecutor::new(PipelineConfig {
        checkpoint_dir: Some(state_dir.to_path_buf()),
    });
    let outcome = synthesize(&executor, &mut design, &options);
    // Operations that ran before a failure have already mutated the design.
    design.save(&design_path)?;
    let result = outcome?;

    println!("Family: {}", result.family);
    println!(
        "Checkpoints: {}",
        result
            .executed
            .iter()
            .map(|l| l.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Operations: {}", result.operations);

    if let Some(path) = script {
        std::fs::write(path, design.to_script())
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Script written to {}", path.display());
    }
    Ok(())
}

fn cmd_families() {
    for family in Family::ALL {
        let mark = |b: bool| if b { "yes" } else { "no" };
        println!(
            "{:<12} dsp: {:<4} bram: {}",
            family.name(),
            mark(family.has_dsp()),
            mark(family.has_bram())
        );
    }
}
