//! Enumeration of specialized TDP36K block RAM cell types.
//!
//! With `-bram_types` every generic `TDP36K` cell is re-typed to a cell name
//! that encodes its mode and port widths. The enumeration order is fixed:
//! non-split then split configurations declared in the fabric, followed by
//! non-split then split configurations produced by memory inference.

use std::fmt::Write as _;

/// Data widths of a non-split (36k) port.
pub const NONSPLIT_WIDTHS: [u32; 6] = [1, 2, 4, 9, 18, 36];

/// Data widths of one half of a split (dual 18k) block.
pub const SPLIT_WIDTHS: [u32; 5] = [1, 2, 4, 9, 18];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BramMode {
    Ram,
    FifoAsync,
    FifoSync,
}

impl BramMode {
    pub const ALL: [BramMode; 3] = [BramMode::Ram, BramMode::FifoAsync, BramMode::FifoSync];

    fn tag(self) -> &'static str {
        match self {
            BramMode::Ram => "BRAM",
            BramMode::FifoAsync => "FIFO_ASYNC",
            BramMode::FifoSync => "FIFO_SYNC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geometry {
    NonSplit { a: u32, b: u32 },
    Split { a1: u32, b1: u32, a2: u32, b2: u32 },
}

impl Geometry {
    fn is_split(self) -> bool {
        matches!(self, Geometry::Split { .. })
    }

    fn ports(self) -> Vec<(&'static str, u32)> {
        match self {
            Geometry::NonSplit { a, b } => vec![("a", a), ("b", b)],
            Geometry::Split { a1, b1, a2, b2 } => {
                vec![("a1", a1), ("b1", b1), ("a2", a2), ("b2", b2)]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BramVariant {
    pub mode: BramMode,
    pub geometry: Geometry,
    /// Produced by memory inference rather than instantiated in the source.
    pub inferred: bool,
}

impl BramVariant {
    /// e.g. `TDP36K_FIFO_ASYNC_A_X9_B_X18_nonsplit`.
    pub fn cell_name(&self) -> String {
        let mut name = format!("TDP36K_{}", self.mode.tag());
        for (port, width) in self.geometry.ports() {
            let _ = write!(name, "_{}_X{}", port.to_uppercase(), width);
        }
        name.push_str(if self.geometry.is_split() { "_split" } else { "_nonsplit" });
        name
    }

    /// The `chtype` command re-typing matching cells to [`cell_name`](Self::cell_name).
    pub fn command(&self) -> String {
        let mut cmd = format!("chtype -set {} t:TDP36K", self.cell_name());
        if self.inferred {
            cmd.push_str(" a:is_inferred=1 %i");
            for (port, width) in self.geometry.ports() {
                let _ = write!(cmd, " a:port_{port}_width={width} %i");
            }
            return cmd;
        }
        cmd.push_str(" a:is_inferred=0 %i");
        if self.geometry.is_split() {
            cmd.push_str(" a:is_split=1 %i");
        }
        match self.mode {
            BramMode::Ram => cmd.push_str(" a:is_fifo=0 %i"),
            BramMode::FifoAsync => cmd.push_str(" a:is_fifo=1 %i a:sync_fifo=0 %i"),
            BramMode::FifoSync => cmd.push_str(" a:is_fifo=1 %i a:sync_fifo=1 %i"),
        }
        for (port, width) in self.geometry.ports() {
            let _ = write!(cmd, " a:port_{port}_dwidth={width} %i");
        }
        cmd
    }
}

fn nonsplit_geometries() -> impl Iterator<Item = Geometry> {
    NONSPLIT_WIDTHS
        .into_iter()
        .flat_map(|a| NONSPLIT_WIDTHS.into_iter().map(move |b| Geometry::NonSplit { a, b }))
}

fn split_geometries() -> impl Iterator<Item = Geometry> {
    SPLIT_WIDTHS.into_iter().flat_map(|a1| {
        SPLIT_WIDTHS.into_iter().flat_map(move |b1| {
            SPLIT_WIDTHS.into_iter().flat_map(move |a2| {
                SPLIT_WIDTHS
                    .into_iter()
                    .map(move |b2| Geometry::Split { a1, b1, a2, b2 })
            })
        })
    })
}

fn declared(geometry: Geometry) -> impl Iterator<Item = BramVariant> {
    BramMode::ALL.into_iter().map(move |mode| BramVariant {
        mode,
        geometry,
        inferred: false,
    })
}

fn inferred(geometry: Geometry) -> BramVariant {
    BramVariant {
        mode: BramMode::Ram,
        geometry,
        inferred: true,
    }
}

/// Every specialized variant, in emission order.
pub fn variants() -> Vec<BramVariant> {
    nonsplit_geometries()
        .flat_map(declared)
        .chain(split_geometries().flat_map(declared))
        .chain(nonsplit_geometries().map(inferred))
        .chain(split_geometries().map(inferred))
        .collect()
}
