//! The synthesis stage table: one [`Stage`] per checkpoint, in execution
//! order, listing every command any family or option combination can run.

use std::sync::OnceLock;

use qlsynth_types::{Family, Label};

use crate::dsp::{K6N10F_DSP_RULES, K6N10_DSP_RULE};
use crate::guard::{Flag, Guard};
use crate::stage::{Stage, Step};

use Family::{Pp3, QlfK4n8, QlfK6n10, QlfK6n10f};

/// The full table, built once.
pub fn stages() -> &'static [Stage] {
    static TABLE: OnceLock<Vec<Stage>> = OnceLock::new();
    TABLE.get_or_init(build)
}

/// The stage for `label`.
pub fn stage(label: Label) -> &'static Stage {
    &stages()[label.index()]
}

fn only(families: &[Family]) -> Guard {
    Guard::families(families)
}

fn build() -> Vec<Stage> {
    vec![
        begin(),
        prepare(),
        map_dsp(),
        coarse(),
        map_bram(),
        map_ffram(),
        map_gates(),
        map_ffs(),
        map_luts(),
        map_cells(),
        check(),
        iomap(),
        finalize(),
        blif(),
        edif(),
        verilog(),
    ]
}

fn begin() -> Stage {
    // -nomem2reg keeps the block RAM models from being flattened; only their
    // port definitions and specify blocks are needed here.
    Stage::new(
        Label::Begin,
        vec![
            Step::render(|b| {
                format!(
                    "read_verilog -lib -specify -nomem2reg {lib}common/cells_sim.v {lib}{fam}/cells_sim.v",
                    lib = b.lib,
                    fam = b.family
                )
            })
            .arg_when(only(&[QlfK6n10f]), |b| {
                format!(
                    "{lib}{fam}/dsp_sim.v {lib}{fam}/brams_sim.v",
                    lib = b.lib,
                    fam = b.family
                )
            })
            .arg_when(
                only(&[QlfK6n10f]).and(Guard::Set(Flag::BramTypes)),
                |b| format!("{}{}/bram_types_sim.v", b.lib, b.family),
            ),
            Step::render(|b| format!("hierarchy -check {}", b.top_option)),
        ],
    )
}

fn prepare() -> Stage {
    Stage::new(
        Label::Prepare,
        vec![
            Step::cmd("proc"),
            Step::cmd("flatten"),
            Step::cmd("tribuf -logic").when(only(&[Pp3])),
            Step::cmd("deminout"),
            Step::cmd("opt_expr"),
            Step::cmd("opt_clean"),
            Step::cmd("check"),
            Step::cmd("opt -nodffe -nosdff"),
            Step::cmd("fsm"),
            Step::render(|b| format!("opt{}", b.dff_args)),
            Step::cmd("wreduce"),
            Step::cmd("peepopt"),
            Step::cmd("opt_clean"),
            Step::cmd("share"),
        ],
    )
}

fn map_dsp() -> Stage {
    let k6n10 = || only(&[QlfK6n10]);
    let k6n10f = || only(&[QlfK6n10f]);
    Stage::new(
        Label::MapDsp,
        vec![
            Step::cmd("memory_dff").when(k6n10()),
            Step::cmd("wreduce t:$mul").when(k6n10()),
            Step::render(|b| {
                format!(
                    "techmap -map +/mul2dsp.v -map {}{}/dsp_map.v {}",
                    b.lib,
                    b.family,
                    K6N10_DSP_RULE.defines()
                )
            })
            .when(k6n10()),
            Step::cmd("select a:mul2dsp").when(k6n10()),
            Step::cmd("setattr -unset mul2dsp").when(k6n10()),
            Step::cmd("opt_expr -fine").when(k6n10()),
            Step::cmd("wreduce").when(k6n10()),
            Step::cmd("select -clear").when(k6n10()),
            Step::cmd("ql_dsp").when(k6n10()),
            Step::cmd("chtype -set $mul t:$__soft_mul").when(k6n10()),
            Step::cmd("wreduce t:$mul").when(k6n10f()),
            Step::cmd("ql_dsp_macc")
                .when(k6n10f())
                .arg_when(Guard::Set(Flag::UseDspCfgParams), |_| {
                    "-use_dsp_cfg_params".to_string()
                }),
            Step::dsp_rules(K6N10F_DSP_RULES).when(k6n10f()),
            Step::render(|b| format!("techmap -map {}{}/dsp_map.v -D USE_DSP_CFG_PARAMS=0", b.lib, b.family))
                .when(k6n10f())
                .when(Guard::Unset(Flag::UseDspCfgParams)),
            Step::render(|b| format!("techmap -map {}{}/dsp_map.v -D USE_DSP_CFG_PARAMS=1", b.lib, b.family))
                .when(k6n10f())
                .when(Guard::Set(Flag::UseDspCfgParams)),
            Step::cmd("ql_dsp_simd").when(k6n10f()),
            Step::render(|b| format!("techmap -map {}{}/dsp_final_map.v", b.lib, b.family))
                .when(k6n10f()),
            Step::cmd("ql_dsp_io_regs").when(k6n10f()),
        ],
    )
    .when(Guard::Unset(Flag::NoDsp))
}

fn coarse() -> Stage {
    Stage::new(
        Label::Coarse,
        vec![
            Step::cmd("techmap -map +/cmp2lut.v -D LUT_WIDTH=4"),
            Step::cmd("opt_expr"),
            Step::cmd("opt_clean"),
            Step::cmd("alumacc"),
            Step::cmd("pmuxtree"),
            Step::render(|b| format!("opt{}", b.dff_args)),
            Step::cmd("memory -nomap"),
            Step::cmd("opt_clean"),
        ],
    )
}

fn map_bram() -> Stage {
    Stage::new(
        Label::MapBram,
        vec![
            Step::render(|b| format!("memory_libmap -lib {}{}/libmap_brams.txt", b.lib, b.family))
                .when(only(&[QlfK6n10f])),
            Step::cmd("ql_bram_merge").when(only(&[QlfK6n10f])),
            Step::render(|b| format!("techmap -map {}{}/libmap_brams_map.v", b.lib, b.family))
                .when(only(&[QlfK6n10f])),
            Step::render(|b| format!("memory_bram -rules {}{}/brams.txt", b.lib, b.family))
                .when(only(&[Pp3, QlfK6n10])),
            Step::cmd("pp3_braminit").when(only(&[Pp3])),
            Step::render(|b| format!("techmap -autoproc -map {}{}/brams_map.v", b.lib, b.family)),
            Step::render(|b| format!("techmap -map {}{}/brams_final_map.v", b.lib, b.family))
                .when(only(&[QlfK6n10f])),
            Step::bram_types().when(Guard::Set(Flag::BramTypes)),
        ],
    )
    .when(only(&[Pp3, QlfK6n10, QlfK6n10f]))
    .when(Guard::Unset(Flag::NoBram))
}

fn map_ffram() -> Stage {
    Stage::new(
        Label::MapFfram,
        vec![
            Step::render(|b| format!("opt -fast -mux_undef -undriven -fine{}", b.dff_args)),
            Step::cmd(
                "memory_map -iattr -attr !ram_block -attr !rom_block -attr logic_block \
                 -attr syn_ramstyle=auto -attr syn_ramstyle=registers \
                 -attr syn_romstyle=auto -attr syn_romstyle=logic",
            ),
            Step::render(|b| format!("opt -undriven -fine{}", b.dff_args)),
        ],
    )
}

fn map_gates() -> Stage {
    let arith = only(&[QlfK4n8, QlfK6n10, QlfK6n10f]).and(Guard::Unset(Flag::NoAdder));
    Stage::new(
        Label::MapGates,
        vec![
            Step::render(|b| format!("techmap -map +/techmap.v -map {}{}/arith_map.v", b.lib, b.family))
                .when(arith),
            Step::cmd("techmap").when(only(&[Pp3]).or(Guard::Set(Flag::NoAdder))),
            Step::render(|b| format!("opt -fast{}", b.dff_args)),
            Step::cmd("muxcover -mux8 -mux4").when(only(&[Pp3])),
            Step::cmd("opt_expr"),
            Step::cmd("opt_merge"),
            Step::cmd("opt_clean"),
            Step::render(|b| format!("opt{}", b.dff_args)),
        ],
    )
}

fn map_ffs() -> Stage {
    Stage::new(
        Label::MapFfs,
        vec![
            Step::cmd("opt_expr"),
            Step::cmd("shregmap -minlen 8 -maxlen 8").when(only(&[QlfK4n8])),
            Step::cmd(
                "dfflegalize -cell $_DFF_P_ 0 -cell $_DFF_P??_ 0 -cell $_DFF_N_ 0 \
                 -cell $_DFF_N??_ 0 -cell $_DFFSR_???_ 0",
            )
            .when(only(&[QlfK4n8])),
            Step::cmd(
                "dfflegalize -cell $_DFF_P_ 0 -cell $_DFF_PP?_ 0 -cell $_DFFE_PP?P_ 0 \
                 -cell $_DFFSR_PPP_ 0 -cell $_DFFSRE_PPPP_ 0 -cell $_DLATCHSR_PPP_ 0",
            )
            .when(only(&[QlfK6n10])),
            Step::cmd("shregmap -minlen 8 -maxlen 20").when(only(&[QlfK6n10f])),
            // Plain latches survive dfflegalize even when not listed, so they
            // are allowed here and folded into $_DLATCHSR_ by ffs_map.v.
            Step::cmd("dfflegalize -cell $_DFFSRE_?NNP_ 0 -cell $_DLATCHSR_?NN_ 0 -cell $_DLATCH_?_ 0")
                .when(only(&[QlfK6n10f]))
                .arg_when(Guard::Unset(Flag::NoSdff), |_| "-cell $_SDFFE_?N?P_ 0".to_string()),
            Step::cmd("dfflegalize -cell $_DFFSRE_PPPP_ 0 -cell $_DLATCH_?_ x").when(only(&[Pp3])),
            Step::render(|b| format!("techmap -map {}{}/cells_map.v", b.lib, b.family))
                .when(only(&[Pp3])),
            Step::render(|b| format!("techmap -map +/techmap.v -map {}{}/ffs_map.v", b.lib, b.family))
                .when(Guard::Unset(Flag::NoFfMap)),
            Step::cmd("opt_expr -mux_undef").when(only(&[Pp3])),
            Step::cmd("opt_merge"),
            Step::cmd("opt_clean"),
            Step::render(|b| format!("opt{}", b.dff_args)),
        ],
    )
}

fn map_luts() -> Stage {
    let opt = || Guard::Unset(Flag::NoAbcOpt);
    let k6 = || only(&[QlfK6n10, QlfK6n10f]).and(opt());
    let pp3 = || only(&[Pp3]).and(opt());
    Stage::new(
        Label::MapLuts,
        vec![
            Step::render(|b| format!("read_verilog -lib -specify -icells {}pp3/abc9_model.v", b.lib))
                .when(k6())
                .when(Guard::Unset(Flag::NoAbc9)),
            Step::cmd("abc9 -maxlut 6")
                .when(k6())
                .when(Guard::Unset(Flag::NoAbc9)),
            Step::cmd("abc -lut 6").when(k6()).when(Guard::Set(Flag::NoAbc9)),
            Step::cmd("abc -lut 4").when(only(&[QlfK4n8]).and(opt())),
            Step::render(|b| format!("techmap -map {}{}/latches_map.v", b.lib, b.family))
                .when(pp3()),
            Step::render(|b| format!("read_verilog -lib -specify -icells {}{}/abc9_model.v", b.lib, b.family))
                .when(pp3())
                .when(Guard::Unset(Flag::NoAbc9)),
            Step::render(|b| format!("techmap -map {}{}/abc9_map.v", b.lib, b.family))
                .when(pp3())
                .when(Guard::Unset(Flag::NoAbc9)),
            Step::cmd("abc9 -maxlut 4 -dff")
                .when(pp3())
                .when(Guard::Unset(Flag::NoAbc9)),
            Step::render(|b| format!("techmap -map {}{}/abc9_unmap.v", b.lib, b.family))
                .when(pp3())
                .when(Guard::Unset(Flag::NoAbc9)),
            Step::render(|b| format!("abc -script {}", b.abc_script))
                .when(pp3())
                .when(Guard::Set(Flag::NoAbc9)),
            Step::cmd("clean"),
            Step::cmd("opt_lut"),
        ],
    )
}

fn map_cells() -> Stage {
    Stage::new(
        Label::MapCells,
        vec![
            Step::render(|b| format!("techmap -map {}{}/lut_map.v", b.lib, b.family)),
            Step::cmd("clean"),
        ],
    )
    .when(only(&[Pp3, QlfK6n10]))
}

fn check() -> Stage {
    Stage::new(
        Label::Check,
        vec![
            Step::cmd("autoname"),
            Step::cmd("hierarchy -check"),
            Step::cmd("stat"),
            Step::cmd("check -noinit"),
        ],
    )
}

fn iomap() -> Stage {
    Stage::new(
        Label::Iomap,
        vec![
            Step::cmd("clkbufmap -inpad ckpad Q:P"),
            Step::cmd("iopadmap -bits -outpad outpad A:P -inpad inpad Q:P -tinoutpad bipad EN:Q:A:P A:top"),
        ],
    )
    .when(only(&[Pp3]))
}

fn finalize() -> Stage {
    Stage::new(
        Label::Finalize,
        vec![
            Step::cmd("setundef -zero -params -undriven").when(only(&[Pp3])),
            Step::cmd("hilomap -hicell logic_1 a -locell logic_0 a -singleton A:top")
                .when(only(&[Pp3]).or(Guard::Set(Flag::Edif))),
            Step::cmd("opt_clean -purge"),
            Step::cmd("check"),
            Step::cmd("blackbox =A:whitebox"),
        ],
    )
}

fn blif() -> Stage {
    Stage::new(
        Label::Blif,
        vec![Step::render(|b| format!("write_blif -param {}", b.blif))],
    )
    .when(Guard::Set(Flag::Blif))
}

fn edif() -> Stage {
    Stage::new(
        Label::Edif,
        vec![
            Step::cmd("splitnets -ports -format ()"),
            Step::cmd("quicklogic_eqn"),
            Step::render(|b| {
                format!(
                    "write_ql_edif -nogndvcc -attrprop -pvector par {} {}",
                    b.top_module, b.edif
                )
            }),
        ],
    )
    .when(Guard::Set(Flag::Edif))
}

fn verilog() -> Stage {
    Stage::new(
        Label::Verilog,
        vec![Step::render(|b| format!("write_verilog -noattr -nohex {}", b.verilog))],
    )
    .when(Guard::Set(Flag::Verilog))
}
